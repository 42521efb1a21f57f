use super::engine::{Engine, Route};
use crate::container::{Container, Invokable};
use crate::error::{ContainerError, FrameworkError};
use crate::http::Context;
use crate::middleware::{into_boxed, Middleware};
use crate::server;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Method;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// What a handler may return
///
/// Handlers usually write their response into the [`Context`] and return
/// `()`. Returning `Err` hands the error to the engine, which logs it and
/// answers with a JSON error response.
pub trait HandlerResult {
    fn into_result(self) -> Result<(), FrameworkError>;
}

impl HandlerResult for () {
    fn into_result(self) -> Result<(), FrameworkError> {
        Ok(())
    }
}

impl<E: Into<FrameworkError>> HandlerResult for Result<(), E> {
    fn into_result(self) -> Result<(), FrameworkError> {
        self.map_err(Into::into)
    }
}

/// Routes requests to handlers through the container
///
/// Every handler takes the request [`Context`] as its first parameter; all
/// further parameters are resolved from the container on each request and
/// released once the handler returns.
///
/// # Example
///
/// ```rust,no_run
/// use satchel::{Container, Context, Engine, Router};
/// use std::sync::Arc;
///
/// struct Greeter;
///
/// impl Greeter {
///     fn greet(&self, name: &str) -> String {
///         format!("hello {}", name)
///     }
/// }
///
/// # async fn run() -> std::io::Result<()> {
/// let container = Arc::new(Container::new());
/// container.add_singleton(Arc::new(Engine::new())).unwrap();
/// container.add_singleton(Arc::new(Greeter)).unwrap();
///
/// let router = Router::new(container).unwrap();
/// router.get("/hello/{name}", |ctx: Context, greeter: Arc<Greeter>| {
///     let name = ctx.param("name").unwrap_or("world").to_string();
///     ctx.text(200, greeter.greet(&name));
/// });
/// router.run("127.0.0.1:8080").await
/// # }
/// ```
#[derive(Clone)]
pub struct Router {
    engine: Arc<Engine>,
    container: Arc<Container>,
}

impl Router {
    /// Create a router over `container`
    ///
    /// The container must hold the engine as an `Arc<Engine>` singleton;
    /// otherwise this fails with [`ContainerError::TypeNotRegistered`].
    pub fn new(container: Arc<Container>) -> Result<Self, ContainerError> {
        let (engine, _release) = container.get_instance::<Arc<Engine>>()?;
        Ok(Self { engine, container })
    }

    /// The engine requests are dispatched on
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The container handlers are invoked through
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Register a handler for an arbitrary method
    pub fn route<H, I>(&self, method: Method, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        let container = self.container.clone();
        let route = self.engine.route(method, path, move |ctx: &Context| {
            container.invoke(&handler, (ctx.clone(),))?.into_result()
        });
        RouteBuilder {
            router: self,
            route,
        }
    }

    /// Register a GET route
    pub fn get<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Register a POST route
    pub fn post<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Register a PUT route
    pub fn put<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    /// Register a DELETE route
    pub fn delete<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Register a PATCH route
    pub fn patch<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::PATCH, path, handler)
    }

    /// Register an OPTIONS route
    pub fn options<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::OPTIONS, path, handler)
    }

    /// Register a HEAD route
    pub fn head<H, I>(&self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.route(Method::HEAD, path, handler)
    }

    /// Add global middleware (runs on every matched request)
    pub fn middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.engine.middleware(middleware);
        self
    }

    /// Dispatch a raw request through the engine
    pub async fn handle<B>(&self, req: hyper::Request<B>) -> hyper::Response<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        self.engine.handle(req).await
    }

    /// Serve on `addr` until the process ends
    pub async fn run(&self, addr: &str) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending(), addr).await
    }

    /// Serve on `addr` until `signal` resolves
    ///
    /// Once the signal fires no new connections are accepted; connections
    /// already in flight are left to finish on their own.
    pub async fn run_with_shutdown<F>(&self, signal: F, addr: &str) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves
    pub async fn serve<F>(&self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        server::serve(self.engine.clone(), listener, signal).await
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// Builder returned by route registration, for attaching route middleware
pub struct RouteBuilder<'r> {
    router: &'r Router,
    route: Arc<Route>,
}

impl<'r> RouteBuilder<'r> {
    /// Add middleware that runs only for this route, after global middleware
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// router.get("/admin", dashboard)
    ///     .middleware(JwtMiddleware::from_config(&jwt))
    ///     .middleware(RequirePermissions::new(Assertion::has_any(["admin"])));
    /// ```
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.route.add_middleware(into_boxed(middleware));
        self
    }

    /// Register another route on the same router
    pub fn route<H, I>(self, method: Method, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.route(method, path, handler)
    }

    /// Register a GET route on the same router
    pub fn get<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.get(path, handler)
    }

    /// Register a POST route on the same router
    pub fn post<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.post(path, handler)
    }

    /// Register a PUT route on the same router
    pub fn put<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.put(path, handler)
    }

    /// Register a DELETE route on the same router
    pub fn delete<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.delete(path, handler)
    }

    /// Register a PATCH route on the same router
    pub fn patch<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.patch(path, handler)
    }

    /// Register an OPTIONS route on the same router
    pub fn options<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.options(path, handler)
    }

    /// Register a HEAD route on the same router
    pub fn head<H, I>(self, path: &str, handler: H) -> RouteBuilder<'r>
    where
        H: Invokable<(Context,), I> + Send + Sync + 'static,
        H::Output: HandlerResult,
        I: 'static,
    {
        self.router.head(path, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{BoxError, Dispose};
    use http_body_util::{BodyExt, Empty};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        hits: AtomicUsize,
    }

    #[derive(Clone)]
    struct Session {
        closed: Arc<AtomicUsize>,
    }

    impl Dispose for Session {
        fn dispose(&self) -> Result<(), BoxError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn router() -> Router {
        let container = Arc::new(Container::new());
        container.add_singleton(Arc::new(Engine::new())).unwrap();
        Router::new(container).unwrap()
    }

    fn request(method: Method, uri: &str) -> hyper::Request<Empty<Bytes>> {
        hyper::Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    async fn body_string(response: hyper::Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_new_requires_engine() {
        let err = Router::new(Arc::new(Container::new())).unwrap_err();
        assert_eq!(err, ContainerError::not_registered::<Arc<Engine>>());
    }

    #[tokio::test]
    async fn test_handler_receives_injected_singleton() {
        let router = router();
        router
            .container()
            .add_singleton(Arc::new(Counter {
                hits: AtomicUsize::new(0),
            }))
            .unwrap();
        router.post("/hit", |ctx: Context, counter: Arc<Counter>| {
            let hits = counter.hits.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.text(200, hits.to_string());
        });

        let first = router.handle(request(Method::POST, "/hit")).await;
        assert_eq!(body_string(first).await, "1");
        let second = router.handle(request(Method::POST, "/hit")).await;
        assert_eq!(body_string(second).await, "2");
    }

    #[tokio::test]
    async fn test_transient_released_after_each_request() {
        let router = router();
        let closed = Arc::new(AtomicUsize::new(0));
        let tracker = closed.clone();
        router
            .container()
            .add_disposable(move || Session {
                closed: tracker.clone(),
            })
            .unwrap();
        router.get("/session", |ctx: Context, _session: Session| {
            ctx.status(204);
        });

        for _ in 0..3 {
            let response = router.handle(request(Method::GET, "/session")).await;
            assert_eq!(response.status(), 204);
        }
        assert_eq!(closed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unregistered_parameter_is_500() {
        let router = router();
        router.get("/missing", |ctx: Context, _counter: Arc<Counter>| {
            ctx.text(200, "unreachable");
        });

        let response = router.handle(request(Method::GET, "/missing")).await;
        assert_eq!(response.status(), 500);
        assert!(body_string(response).await.contains("not registered"));
    }

    #[tokio::test]
    async fn test_handler_may_return_error() {
        let router = router();
        router.delete("/users/{id}", |ctx: Context| -> Result<(), FrameworkError> {
            let id = ctx.param("id")?;
            if id == "root" {
                return Err(FrameworkError::Forbidden);
            }
            ctx.status(204);
            Ok(())
        });

        let response = router.handle(request(Method::DELETE, "/users/root")).await;
        assert_eq!(response.status(), 403);
        let response = router.handle(request(Method::DELETE, "/users/7")).await;
        assert_eq!(response.status(), 204);
    }

    #[tokio::test]
    async fn test_route_middleware_only_applies_to_its_route() {
        let router = router();
        router
            .get("/tagged", |ctx: Context| ctx.text(200, "tagged"))
            .middleware(|ctx: &Context| ctx.set_header("X-Route", "tagged"))
            .get("/plain", |ctx: Context| ctx.text(200, "plain"));

        let tagged = router.handle(request(Method::GET, "/tagged")).await;
        assert_eq!(tagged.headers().get("x-route").unwrap(), "tagged");
        let plain = router.handle(request(Method::GET, "/plain")).await;
        assert!(plain.headers().get("x-route").is_none());
    }

    #[tokio::test]
    async fn test_global_middleware_header_survives_handler_body() {
        let router = router();
        router.middleware(|ctx: &Context| ctx.set_header("X-Request-Id", "abc"));
        router.get("/ping", |ctx: Context| ctx.text(200, "pong"));

        let response = router.handle(request(Method::GET, "/ping")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc");
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "pong");
    }

    #[tokio::test]
    async fn test_builder_chains_every_verb() {
        let router = router();
        router
            .patch("/patch", |ctx: Context| ctx.text(200, "patch"))
            .options("/options", |ctx: Context| ctx.text(200, "options"))
            .head("/head", |ctx: Context| ctx.text(200, "head"))
            .middleware(|ctx: &Context| ctx.set_header("X-Head", "1"));

        let response = router.handle(request(Method::PATCH, "/patch")).await;
        assert_eq!(body_string(response).await, "patch");
        let response = router.handle(request(Method::OPTIONS, "/options")).await;
        assert_eq!(body_string(response).await, "options");
        let response = router.handle(request(Method::HEAD, "/head")).await;
        assert_eq!(response.headers().get("x-head").unwrap(), "1");
        assert_eq!(body_string(response).await, "");
    }
}
