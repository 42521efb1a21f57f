use crate::config::env::{env, env_required};
use crate::error::ConfigError;

/// Token verification settings for [`JwtMiddleware`](crate::auth::JwtMiddleware)
///
/// Tokens are HS256-signed with `secret` and must carry exactly this issuer
/// and audience.
#[derive(Clone, PartialEq)]
pub struct JwtConfig {
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    /// HMAC secret
    pub secret: String,
    /// Clock skew tolerated for `exp` and `nbf`, in seconds
    pub leeway: u64,
}

impl JwtConfig {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret: secret.into(),
            leeway: 0,
        }
    }

    /// Build config from JWT_ISSUER, JWT_AUDIENCE, JWT_SECRET and JWT_LEEWAY
    ///
    /// The secret is required; issuer and audience default to the app name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            issuer: env("JWT_ISSUER", "satchel".to_string()),
            audience: env("JWT_AUDIENCE", "satchel".to_string()),
            secret: env_required("JWT_SECRET")?,
            leeway: env("JWT_LEEWAY", 0),
        })
    }

    /// Set the tolerated clock skew in seconds
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .field("leeway", &self.leeway)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new("issuer", "audience", "hunter2").with_leeway(30);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("leeway: 30"));
    }
}
