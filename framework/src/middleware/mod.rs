//! Request middleware
//!
//! Middleware runs before the route handler, in registration order: global
//! middleware first, then middleware attached to the matched route. Any
//! middleware may write a response and [`abort`](crate::http::Context::abort)
//! the chain, in which case the remaining middleware and the handler are
//! skipped.

mod registry;

pub use registry::MiddlewareRegistry;

use crate::http::Context;
use std::sync::Arc;

/// A step in the request pipeline
///
/// # Example
///
/// ```rust
/// use satchel::{Context, Middleware};
///
/// struct RequestId;
///
/// impl Middleware for RequestId {
///     fn handle(&self, ctx: &Context) {
///         let id = ctx.header("x-request-id").unwrap_or("none").to_string();
///         ctx.set_header("X-Request-Id", id);
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Inspect or modify the request context
    fn handle(&self, ctx: &Context);
}

impl<F> Middleware for F
where
    F: Fn(&Context) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &Context) {
        self(ctx)
    }
}

/// Shared, type-erased middleware
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Box a middleware for storage in a chain
pub fn into_boxed<M: Middleware>(middleware: M) -> BoxedMiddleware {
    Arc::new(middleware)
}

/// Run `chain` in order, stopping at the first middleware that aborts
///
/// Returns `true` when every middleware ran without aborting.
pub(crate) fn run_chain<'a>(
    chain: impl IntoIterator<Item = &'a BoxedMiddleware>,
    ctx: &Context,
) -> bool {
    for middleware in chain {
        middleware.handle(ctx);
        if ctx.is_aborted() {
            return false;
        }
    }
    true
}
