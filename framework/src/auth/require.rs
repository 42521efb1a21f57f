use super::permissions::{Assertion, Permissions};
use crate::error::FrameworkError;
use crate::http::Context;
use crate::middleware::Middleware;

/// Rejects requests whose token lacks the required permissions
///
/// Runs after [`JwtMiddleware`](super::JwtMiddleware). The permissions are
/// read from a string-list claim of the verified token:
///
/// - No verified token, or the claim is missing or not a string list: 401
///   `{"error":"invalid token"}`.
/// - The assertion does not hold: 403 `{"error":"forbidden"}`.
#[derive(Debug, Clone)]
pub struct RequirePermissions {
    claim: String,
    assertion: Assertion,
}

impl RequirePermissions {
    /// Check `assertion` against the `permissions` claim
    pub fn new(assertion: Assertion) -> Self {
        Self::claim("permissions", assertion)
    }

    /// Check `assertion` against the string-list claim `claim`
    pub fn claim(claim: impl Into<String>, assertion: Assertion) -> Self {
        Self {
            claim: claim.into(),
            assertion,
        }
    }
}

impl Middleware for RequirePermissions {
    fn handle(&self, ctx: &Context) {
        let Some(claims) = ctx.claims() else {
            tracing::debug!(path = ctx.path(), "permissions required but no verified token");
            ctx.abort_with(FrameworkError::unauthorized("invalid token"));
            return;
        };

        let permissions: Permissions = match claims.string_list(&self.claim) {
            Ok(list) => list.into_iter().collect(),
            Err(err) => {
                tracing::debug!(claim = %self.claim, error = %err, "unreadable permissions claim");
                ctx.abort_with(FrameworkError::unauthorized("invalid token"));
                return;
            }
        };

        if !self.assertion.check(&permissions) {
            tracing::debug!(path = ctx.path(), subject = claims.subject(), "permission denied");
            ctx.abort_with(FrameworkError::Forbidden);
        }
    }
}
