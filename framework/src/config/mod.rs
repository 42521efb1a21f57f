//! Configuration
//!
//! - Automatic `.env` file loading with environment-based precedence
//! - Type-safe configuration structs
//! - A process-wide repository for looking them up
//!
//! # Example
//!
//! ```rust,no_run
//! use satchel::{Config, ServerConfig};
//!
//! Config::init(std::path::Path::new("."));
//!
//! let server = Config::get::<ServerConfig>().unwrap_or_default();
//! println!("Server port: {}", server.port);
//! ```

pub mod env;
pub mod providers;
pub mod repository;

pub use env::{env, env_optional, env_required, load_dotenv, Environment};
pub use providers::{AppConfig, AppConfigBuilder, JwtConfig, ServerConfig, ServerConfigBuilder};

use std::any::Any;
use std::path::Path;

/// Facade over the config repository
pub struct Config;

impl Config {
    /// Initialize the configuration system
    ///
    /// Loads `.env` files from `project_root` and registers [`AppConfig`] and
    /// [`ServerConfig`]. [`JwtConfig`] is registered only when `JWT_SECRET`
    /// is set.
    ///
    /// Returns the detected environment.
    pub fn init(project_root: &Path) -> Environment {
        let env = env::load_dotenv(project_root);

        repository::register(AppConfig::from_env());
        repository::register(ServerConfig::from_env());
        match JwtConfig::from_env() {
            Ok(jwt) => repository::register(jwt),
            Err(err) => tracing::debug!(error = %err, "JWT verification not configured"),
        }

        env
    }

    /// Get a typed config struct from the repository
    pub fn get<T: Any + Send + Sync + Clone>() -> Option<T> {
        repository::get::<T>()
    }

    /// Register a custom config struct
    ///
    /// # Example
    ///
    /// ```rust
    /// use satchel::Config;
    ///
    /// #[derive(Clone)]
    /// struct CacheConfig {
    ///     ttl_seconds: u64,
    /// }
    ///
    /// Config::register(CacheConfig { ttl_seconds: 60 });
    /// assert_eq!(Config::get::<CacheConfig>().map(|c| c.ttl_seconds), Some(60));
    /// ```
    pub fn register<T: Any + Send + Sync>(config: T) {
        repository::register(config);
    }

    /// Check if a config type is registered
    pub fn has<T: Any>() -> bool {
        repository::has::<T>()
    }

    /// Get the current environment
    ///
    /// Falls back to detecting APP_ENV when [`Config::init`] has not run.
    pub fn environment() -> Environment {
        Config::get::<AppConfig>()
            .map(|c| c.environment)
            .unwrap_or_else(Environment::detect)
    }

    /// Check if debug mode is enabled
    pub fn is_debug() -> bool {
        Config::get::<AppConfig>()
            .map(|c| c.debug)
            .unwrap_or_else(|| env("APP_DEBUG", false))
    }
}
