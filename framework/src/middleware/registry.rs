//! Registry for global middleware
//!
//! Configure global middleware with [`Engine::middleware`](crate::Engine::middleware)
//! or [`Router::middleware`](crate::Router::middleware).

use super::{into_boxed, BoxedMiddleware, Middleware};

/// Registry for global middleware that runs on every request
///
/// # Example
///
/// ```rust
/// use satchel::{Context, MiddlewareRegistry};
///
/// let registry = MiddlewareRegistry::new()
///     .append(|ctx: &Context| ctx.set_header("X-Powered-By", "satchel"));
/// assert_eq!(registry.global_middleware().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    /// Middleware that runs on every request (in order)
    global: Vec<BoxedMiddleware>,
}

impl MiddlewareRegistry {
    /// Create a new empty middleware registry
    pub fn new() -> Self {
        Self { global: Vec::new() }
    }

    /// Append global middleware that runs on every request
    ///
    /// Global middleware runs in the order they are added, before any
    /// route-specific middleware.
    pub fn append<M: Middleware>(mut self, middleware: M) -> Self {
        self.push(into_boxed(middleware));
        self
    }

    /// Append pre-boxed middleware
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.global.push(middleware);
    }

    /// Get the list of global middleware
    pub fn global_middleware(&self) -> &[BoxedMiddleware] {
        &self.global
    }
}
