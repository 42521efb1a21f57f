use satchel::{Context, Middleware};

/// Logs every matched request before it reaches its handler
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle(&self, ctx: &Context) {
        tracing::info!(
            method = %ctx.method(),
            path = ctx.path(),
            authenticated = ctx.header("authorization").is_some(),
            "request"
        );
    }
}
