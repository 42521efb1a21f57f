use satchel::{AppConfig, Context};
use serde_json::json;

pub fn index(ctx: Context, app: AppConfig) {
    ctx.json(
        200,
        &json!({
            "name": app.name,
            "environment": app.environment.to_string(),
        }),
    );
}

/// Who the bearer token says the caller is
pub fn me(ctx: Context) {
    match ctx.claims() {
        Some(claims) => ctx.json(
            200,
            &json!({
                "subject": claims.subject(),
                "issuer": claims.issuer(),
                "permissions": claims.string_list("permissions").unwrap_or_default(),
            }),
        ),
        None => ctx.json(200, &json!({ "subject": null })),
    }
}
