use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Method;
use hyper_util::rt::TokioIo;
use pretty_assertions::assert_eq;
use satchel::testing::TestClient;
use satchel::{Container, ContainerError, Context, Engine, Router};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Yields a constant, to observe that handlers receive the registered instance
struct IntYielder {
    value: i32,
}

impl IntYielder {
    fn get(&self) -> i32 {
        self.value
    }
}

fn yield_value(ctx: Context, yielder: Arc<IntYielder>) {
    ctx.text(200, yielder.get().to_string());
}

const VERBS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
];

fn path_for(method: &Method) -> String {
    format!("/{}", method.as_str().to_lowercase())
}

fn router_with_all_verbs() -> Router {
    let container = Arc::new(Container::new());
    container.add_singleton(Arc::new(Engine::new())).unwrap();
    container
        .add_singleton(Arc::new(IntYielder { value: 42 }))
        .unwrap();

    let router = Router::new(container).unwrap();
    router
        .get("/get", yield_value)
        .post("/post", yield_value)
        .put("/put", yield_value)
        .delete("/delete", yield_value)
        .patch("/patch", yield_value)
        .options("/options", yield_value)
        .head("/head", yield_value);
    router
}

#[test]
fn router_requires_engine_singleton() {
    let err = Router::new(Arc::new(Container::new())).unwrap_err();
    assert!(matches!(err, ContainerError::TypeNotRegistered { .. }));
}

#[tokio::test]
async fn router_dispatches_without_dependencies() {
    let container = Arc::new(Container::new());
    container.add_singleton(Arc::new(Engine::new())).unwrap();
    let router = Router::new(container).unwrap();
    router.get("/test", |ctx: Context| ctx.text(200, "test"));

    let response = TestClient::new(&router).get("/test").send().await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "test");
}

#[tokio::test]
async fn router_dispatches_every_verb_with_dependencies() {
    let router = router_with_all_verbs();
    let client = TestClient::new(&router);

    for method in VERBS {
        let response = client.request(method.clone(), &path_for(&method)).send().await;
        assert_eq!(response.status(), 200, "{} status", method);
        let expected = if method == Method::HEAD { "" } else { "42" };
        assert_eq!(response.text(), expected, "{} body", method);
    }
}

#[tokio::test]
async fn router_shares_engine_registered_routes() {
    let router = router_with_all_verbs();
    let engine = router.engine().clone();
    engine.route(Method::GET, "/direct", |ctx: &Context| {
        ctx.text(200, "direct");
        Ok(())
    });

    let response = TestClient::new(&router).get("/direct").send().await;
    assert_eq!(response.text(), "direct");

    let response = TestClient::new(&router).get("/nowhere").send().await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.text(), "404 Not Found");
}

#[tokio::test]
async fn router_serves_over_tcp_until_shutdown() {
    let router = router_with_all_verbs();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = tokio::spawn({
        let router = router.clone();
        async move {
            router
                .serve(listener, async {
                    let _ = stopped.await;
                })
                .await
        }
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(connection);

    for method in VERBS {
        let request = hyper::Request::builder()
            .method(method.clone())
            .uri(path_for(&method))
            .header("host", addr.to_string())
            .body(Empty::<Bytes>::new())
            .unwrap();
        let response = sender.send_request(request).await.unwrap();
        assert_eq!(response.status(), 200, "{} status", method);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let expected: &[u8] = if method == Method::HEAD { b"" } else { b"42" };
        assert_eq!(&body[..], expected, "{} body", method);
    }

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
