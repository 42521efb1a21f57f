use crate::error::FrameworkError;
use crate::http::{collect_body, Context, HttpResponse};
use crate::middleware::{into_boxed, run_chain, BoxedMiddleware, Middleware, MiddlewareRegistry};
use bytes::Bytes;
use http_body_util::Full;
use hyper::Method;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Type alias for route handlers
///
/// An `Err` is translated into an error response by the engine.
pub type BoxedHandler = Box<dyn Fn(&Context) -> Result<(), FrameworkError> + Send + Sync>;

/// A registered route: its handler plus route-level middleware
pub struct Route {
    handler: BoxedHandler,
    middleware: RwLock<Vec<BoxedMiddleware>>,
}

impl Route {
    /// Attach middleware that runs only for this route
    pub fn add_middleware(&self, middleware: BoxedMiddleware) {
        self.middleware
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    fn dispatch(&self, ctx: &Context) -> Result<(), FrameworkError> {
        let middleware = self
            .middleware
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if run_chain(&middleware, ctx) {
            (self.handler)(ctx)
        } else {
            Ok(())
        }
    }
}

/// The HTTP engine
///
/// Holds one `matchit` route table per method plus the global middleware, and
/// turns incoming hyper requests into responses. Registration takes `&self`,
/// so the engine can be shared through the container as `Arc<Engine>`.
///
/// # Example
///
/// ```rust
/// use satchel::{Context, Engine};
/// use hyper::Method;
///
/// let engine = Engine::new();
/// engine.route(Method::GET, "/ping", |ctx: &Context| {
///     ctx.text(200, "pong");
///     Ok(())
/// });
/// ```
pub struct Engine {
    routes: RwLock<HashMap<Method, MatchitRouter<Arc<Route>>>>,
    middleware: RwLock<MiddlewareRegistry>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            middleware: RwLock::new(MiddlewareRegistry::new()),
        }
    }

    /// Create an engine pre-populated with global middleware
    pub fn with_middleware(registry: MiddlewareRegistry) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            middleware: RwLock::new(registry),
        }
    }

    /// Add global middleware (runs on every matched request)
    pub fn middleware<M: Middleware>(&self, middleware: M) {
        self.middleware
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(into_boxed(middleware));
    }

    /// Register a handler for `method` and `path`
    ///
    /// Paths use `matchit` syntax (`/users/{id}`, `/files/{*path}`). A path
    /// that conflicts with an existing route is rejected with a warning; the
    /// existing route is kept and returned, so middleware attached through the
    /// result still lands on the route that serves the path.
    pub fn route<H>(&self, method: Method, path: &str, handler: H) -> Arc<Route>
    where
        H: Fn(&Context) -> Result<(), FrameworkError> + Send + Sync + 'static,
    {
        let route = Arc::new(Route {
            handler: Box::new(handler),
            middleware: RwLock::new(Vec::new()),
        });

        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let table = routes
            .entry(method.clone())
            .or_insert_with(MatchitRouter::new);
        match table.insert(path, route.clone()) {
            Ok(()) => {
                tracing::debug!(%method, path, "registered route");
                route
            }
            Err(err) => {
                tracing::warn!(%method, path, error = %err, "route not registered");
                match table.at(path) {
                    Ok(existing) => existing.value.clone(),
                    Err(_) => route,
                }
            }
        }
    }

    /// Match a request and return the route with extracted params
    pub fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<Route>, HashMap<String, String>)> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        let matched = routes.get(method)?.at(path).ok()?;
        let params: HashMap<String, String> = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((matched.value.clone(), params))
    }

    /// Handle a raw request
    ///
    /// Collects the body, runs global middleware, route middleware and the
    /// handler, and converts the response written into the context. Handler
    /// errors become JSON error responses. HEAD responses never carry a body.
    pub async fn handle<B>(&self, req: hyper::Request<B>) -> hyper::Response<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();

        let response = match self.match_route(&method, &path) {
            Some((route, params)) => match collect_body(body).await {
                Ok(bytes) => {
                    let ctx = Context::with_params(parts, bytes, params);
                    self.dispatch(&route, &ctx);
                    ctx.take_response()
                }
                Err(err) => HttpResponse::from(err),
            },
            None => HttpResponse::text("404 Not Found").status(404),
        };

        tracing::debug!(%method, path, status = response.status_code(), "handled request");

        if method == Method::HEAD {
            response.without_body().into_hyper()
        } else {
            response.into_hyper()
        }
    }

    fn dispatch(&self, route: &Route, ctx: &Context) {
        let global = self
            .middleware
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if !run_chain(global.global_middleware(), ctx) {
            return;
        }

        if let Err(err) = route.dispatch(ctx) {
            tracing::error!(
                method = %ctx.method(),
                path = ctx.path(),
                error = %err,
                "handler failed"
            );
            ctx.fail(err);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Empty};
    use pretty_assertions::assert_eq;

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

    #[tokio::test]
    async fn test_route_params() {
        let engine = Engine::new();
        engine.route(Method::GET, "/users/{id}", |ctx: &Context| {
            let id = ctx.param("id")?;
            ctx.text(200, format!("user {}", id));
            Ok(())
        });

        let response = engine.handle(request(Method::GET, "/users/7")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "user 7");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let engine = Engine::new();
        engine.route(Method::GET, "/known", |_: &Context| Ok(()));

        let response = engine.handle(request(Method::GET, "/unknown")).await;
        assert_eq!(response.status(), 404);

        let response = engine.handle(request(Method::POST, "/known")).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_response() {
        let engine = Engine::new();
        engine.route(Method::GET, "/fail", |_: &Context| {
            Err(FrameworkError::internal("boom"))
        });

        let response = engine.handle(request(Method::GET, "/fail")).await;
        assert_eq!(response.status(), 500);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Internal server error: boom"}"#
        );
    }

    #[tokio::test]
    async fn test_middleware_order_and_abort() {
        let engine = Engine::new();
        engine.middleware(|ctx: &Context| ctx.set_header("X-Global", "1"));
        let route = engine.route(Method::GET, "/guarded", |ctx: &Context| {
            ctx.text(200, "handler ran");
            Ok(())
        });
        route.add_middleware(into_boxed(|ctx: &Context| {
            if ctx.header("x-allow").is_none() {
                ctx.abort_with(FrameworkError::Forbidden);
            }
        }));

        let response = engine.handle(request(Method::GET, "/guarded")).await;
        assert_eq!(response.status(), 403);
        assert_eq!(response.headers().get("x-global").unwrap(), "1");

        let allowed = hyper::Request::builder()
            .uri("/guarded")
            .header("x-allow", "yes")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let response = engine.handle(allowed).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "handler ran");
    }

    #[tokio::test]
    async fn test_head_response_has_no_body() {
        let engine = Engine::new();
        engine.route(Method::HEAD, "/head", |ctx: &Context| {
            ctx.text(200, "ignored");
            Ok(())
        });

        let response = engine.handle(request(Method::HEAD, "/head")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_conflicting_route_keeps_first() {
        let engine = Engine::new();
        let first = engine.route(Method::GET, "/a", |ctx: &Context| {
            ctx.text(200, "first");
            Ok(())
        });
        let second = engine.route(Method::GET, "/a", |ctx: &Context| {
            ctx.text(200, "second");
            Ok(())
        });
        assert!(Arc::ptr_eq(&first, &second));

        second.add_middleware(into_boxed(|ctx: &Context| ctx.set_header("X-Late", "yes")));

        let response = engine.handle(request(Method::GET, "/a")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("x-late").unwrap(), "yes");
        assert_eq!(body_string(response).await, "first");
    }
}
