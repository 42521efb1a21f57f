//! Bearer token authentication and permission checks
//!
//! [`JwtMiddleware`] verifies the token and stores its [`Claims`] on the
//! request context. [`RequirePermissions`] then gates routes on the
//! permissions listed in a claim.
//!
//! ```rust,ignore
//! router.middleware(JwtMiddleware::from_config(&jwt_config));
//! router
//!     .delete("/posts/{id}", delete_post)
//!     .middleware(RequirePermissions::new(Assertion::or([
//!         Assertion::has_any(["admin"]),
//!         Assertion::has_all(["posts:write", "posts:delete"]),
//!     ])));
//! ```

mod jwt;
mod permissions;
mod require;

pub use jwt::{Claims, JwtError, JwtMiddleware};
pub use permissions::{Assertion, Permissions};
pub use require::RequirePermissions;
