use crate::error::ConfigError;
use std::path::Path;

/// Environment type enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Local
    pub fn detect() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(name: Option<&str>) -> Self {
        match name {
            Some("production") => Self::Production,
            Some("staging") => Self::Staging,
            Some("development") => Self::Development,
            Some("testing") => Self::Testing,
            Some("local") | None => Self::Local,
            Some(other) => Self::Custom(other.to_string()),
        }
    }

    /// Get the .env file suffix for this environment
    pub fn env_file_suffix(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment (local or development)
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_file_suffix())
    }
}

/// Load environment variables from .env files with proper precedence
///
/// Precedence (later entries win):
/// 1. .env (base defaults)
/// 2. .env.local (local overrides, not committed)
/// 3. .env.{environment}
/// 4. .env.{environment}.local
/// 5. Variables already set in the process environment
pub fn load_dotenv(project_root: &Path) -> Environment {
    let env = Environment::detect();
    let suffix = env.env_file_suffix();

    // dotenvy never overwrites, so the most specific file goes first
    let files = [
        format!(".env.{}.local", suffix),
        format!(".env.{}", suffix),
        ".env.local".to_string(),
        ".env".to_string(),
    ];
    for file in &files {
        match dotenvy::from_path(project_root.join(file)) {
            Ok(()) => tracing::debug!(file = %file, "loaded environment file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(file = %file, error = %err, "failed to load environment file"),
        }
    }

    env
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use satchel::config::env;
///
/// let port: u16 = env("SERVER_PORT", 8080);
/// let host = env("SERVER_HOST", "127.0.0.1".to_string());
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get a required environment variable
///
/// # Example
/// ```
/// use satchel::config::env_required;
///
/// let secret: Result<String, _> = env_required("SATCHEL_DOC_UNSET_SECRET");
/// assert!(secret.is_err());
/// ```
pub fn env_required<T: std::str::FromStr>(key: &str) -> Result<T, ConfigError> {
    let raw = std::env::var(key).map_err(|_| ConfigError::Missing {
        key: key.to_string(),
    })?;
    raw.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
    })
}

/// Get an optional environment variable
///
/// # Example
/// ```
/// use satchel::config::env_optional;
///
/// let debug: Option<bool> = env_optional("APP_DEBUG");
/// ```
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
