use satchel::{Context, FrameworkError};
use serde_json::json;
use std::sync::Arc;

use crate::services::{AuditTrail, NewUser, UserStore};

fn user_id(ctx: &Context) -> Result<u64, FrameworkError> {
    let raw = ctx.param("id")?;
    raw.parse()
        .map_err(|_| FrameworkError::body(format!("'{}' is not a user id", raw)))
}

pub fn index(ctx: Context, users: Arc<UserStore>) {
    ctx.json(200, &json!({ "users": users.all() }));
}

pub fn show(ctx: Context, users: Arc<UserStore>) -> Result<(), FrameworkError> {
    let id = user_id(&ctx)?;
    match users.find(id) {
        Some(user) => ctx.json(200, &user),
        None => ctx.json(404, &json!({ "error": "user not found" })),
    }
    Ok(())
}

pub fn store(ctx: Context, users: Arc<UserStore>, audit: AuditTrail) -> Result<(), FrameworkError> {
    let new_user: NewUser = ctx.input()?;
    let user = users.create(new_user.name);
    audit.record("user.created", &user.id.to_string());
    ctx.json(201, &user);
    Ok(())
}

pub fn destroy(ctx: Context, users: Arc<UserStore>, audit: AuditTrail) -> Result<(), FrameworkError> {
    let id = user_id(&ctx)?;
    if users.remove(id) {
        audit.record("user.deleted", &id.to_string());
        ctx.status(204);
    } else {
        ctx.json(404, &json!({ "error": "user not found" }));
    }
    Ok(())
}
