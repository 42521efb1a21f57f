pub mod auth;
pub mod config;
pub mod container;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod testing;

pub use auth::{Assertion, Claims, JwtError, JwtMiddleware, Permissions, RequirePermissions};
pub use config::{AppConfig, Config, Environment, JwtConfig, ServerConfig};
pub use container::{value, BoxError, Container, Dispose, Function, IntoFunction, Invokable, Release, Value};
pub use error::{ConfigError, ContainerError, FrameworkError};
pub use http::{Context, HttpResponse};
pub use middleware::{Middleware, MiddlewareRegistry};
pub use routing::{Engine, HandlerResult, RouteBuilder, Router};
pub use server::Server;
