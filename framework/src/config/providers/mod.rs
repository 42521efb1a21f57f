mod app;
mod jwt;
mod server;

pub use app::{AppConfig, AppConfigBuilder};
pub use jwt::JwtConfig;
pub use server::{ServerConfig, ServerConfigBuilder};
