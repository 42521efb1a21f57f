use satchel::{Assertion, Config, JwtConfig, JwtMiddleware, RequirePermissions, Router};

use crate::controllers;

pub fn register(router: &Router) {
    match Config::get::<JwtConfig>() {
        Some(jwt) => {
            router.middleware(JwtMiddleware::from_config(&jwt));
        }
        None => tracing::warn!("JWT_SECRET not set, every request is anonymous"),
    }

    router.get("/", controllers::home::index);
    router.get("/me", controllers::home::me);

    router
        .get("/users", controllers::user::index)
        .get("/users/{id}", controllers::user::show);

    router
        .post("/users", controllers::user::store)
        .middleware(RequirePermissions::new(Assertion::has_any(["users:write", "admin"])));

    router
        .delete("/users/{id}", controllers::user::destroy)
        .middleware(RequirePermissions::new(Assertion::or([
            Assertion::has_any(["admin"]),
            Assertion::has_all(["users:write", "users:delete"]),
        ])));
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel::testing::TestClient;
    use satchel::Container;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn router() -> Router {
        let container = Arc::new(Container::new());
        crate::bootstrap::register(&container).unwrap();
        let router = Router::new(container).unwrap();
        register(&router);
        router
    }

    #[tokio::test]
    async fn test_users_are_listed_and_shown() {
        let router = router();
        let client = TestClient::new(&router);

        let response = client.get("/users").send().await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.json::<Value>()["users"][1]["name"], json!("Jane"));

        let response = client.get("/users/1").send().await;
        assert_eq!(response.json::<Value>()["name"], json!("John"));

        let response = client.get("/users/42").send().await;
        assert_eq!(response.status(), 404);

        let response = client.get("/users/abc").send().await;
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_writes_require_a_token() {
        let router = router();
        let response = TestClient::new(&router)
            .post("/users")
            .json(&json!({ "name": "Ada" }))
            .send()
            .await;
        assert_eq!(response.status(), 401);
    }
}
