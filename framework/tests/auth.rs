use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pretty_assertions::assert_eq;
use satchel::testing::TestClient;
use satchel::{Assertion, Container, Context, Engine, JwtConfig, JwtMiddleware, RequirePermissions, Router};
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "integration-secret";

fn token(permissions: &[&str]) -> String {
    let claims = json!({
        "iss": "https://auth.example.com",
        "aud": "inventory",
        "sub": "user-7",
        "exp": (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp(),
        "permissions": permissions,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

struct Inventory {
    items: Vec<&'static str>,
}

fn router() -> Router {
    let container = Arc::new(Container::new());
    container.add_singleton(Arc::new(Engine::new())).unwrap();
    container
        .add_singleton(Arc::new(Inventory {
            items: vec!["bolt", "nut"],
        }))
        .unwrap();

    let router = Router::new(container).unwrap();
    let config = JwtConfig::new("https://auth.example.com", "inventory", SECRET);
    router.middleware(JwtMiddleware::from_config(&config));

    router.get("/whoami", |ctx: Context| match ctx.claims() {
        Some(claims) => ctx.text(200, claims.subject().unwrap_or("unknown").to_string()),
        None => ctx.text(200, "anonymous"),
    });
    router
        .get("/items", |ctx: Context, inventory: Arc<Inventory>| {
            ctx.json(200, &inventory.items);
        })
        .middleware(RequirePermissions::new(Assertion::or([
            Assertion::has_any(["admin"]),
            Assertion::has_all(["items:read"]),
        ])));
    router
}

#[tokio::test]
async fn anonymous_requests_pass_the_jwt_middleware() {
    let router = router();
    let response = TestClient::new(&router).get("/whoami").send().await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "anonymous");
}

#[tokio::test]
async fn valid_token_exposes_claims_to_handlers() {
    let router = router();
    let response = TestClient::new(&router)
        .get("/whoami")
        .bearer(&token(&[]))
        .send()
        .await;
    assert_eq!(response.text(), "user-7");
}

#[tokio::test]
async fn invalid_token_is_rejected_before_the_handler() {
    let router = router();
    let response = TestClient::new(&router)
        .get("/whoami")
        .bearer("garbage")
        .send()
        .await;
    assert_eq!(response.status(), 401);
    assert_eq!(response.json::<Value>(), json!({ "error": "invalid token" }));
}

#[tokio::test]
async fn permissions_gate_the_route() {
    let router = router();
    let client = TestClient::new(&router);

    let response = client.get("/items").send().await;
    assert_eq!(response.status(), 401);

    let response = client.get("/items").bearer(&token(&["orders:read"])).send().await;
    assert_eq!(response.status(), 403);
    assert_eq!(response.json::<Value>(), json!({ "error": "forbidden" }));

    let response = client.get("/items").bearer(&token(&["items:read"])).send().await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Vec<String>>(), vec!["bolt", "nut"]);

    let response = client.get("/items").bearer(&token(&["admin"])).send().await;
    assert_eq!(response.status(), 200);
}
