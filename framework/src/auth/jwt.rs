use crate::config::JwtConfig;
use crate::error::FrameworkError;
use crate::http::Context;
use crate::middleware::Middleware;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Token verification and claim access failures
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signature, issuer, audience or time checks failed, or the token is malformed
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    /// The claim is absent
    #[error("claim '{0}' is missing")]
    MissingClaim(String),

    /// The claim is present with a different type
    #[error("claim '{name}' has an unexpected type: {source}")]
    ClaimType {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The verified claim set of a token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    claims: Map<String, Value>,
}

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Deserialize the claim `name`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, JwtError> {
        let value = self
            .claims
            .get(name)
            .ok_or_else(|| JwtError::MissingClaim(name.to_string()))?;
        T::deserialize(value).map_err(|source| JwtError::ClaimType {
            name: name.to_string(),
            source,
        })
    }

    /// The claim `name` as a list of strings
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, JwtError> {
        self.get(name)
    }

    /// The `iss` claim
    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }

    /// The `sub` claim
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    /// The `aud` claim, which may be a single string or a list
    pub fn audience(&self) -> Vec<&str> {
        match self.claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// All claims
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.claims
    }
}

impl Context {
    /// Claims verified by [`JwtMiddleware`] for this request
    ///
    /// `None` when the request carried no `Authorization` header.
    pub fn claims(&self) -> Option<Claims> {
        self.get::<Claims>()
    }
}

/// Verifies the bearer token in the `Authorization` header
///
/// - No header: the request continues unauthenticated.
/// - Invalid token: 401 `{"error":"invalid token"}` and the chain stops.
/// - Valid token: its [`Claims`] are stored on the context.
///
/// Tokens must be HS256-signed and carry the configured `iss` and `aud`.
/// `exp` and `nbf` are checked when present.
///
/// # Example
///
/// ```rust,ignore
/// router.middleware(JwtMiddleware::new("https://auth.example.com", "api", secret));
/// router.get("/me", |ctx: Context| match ctx.claims() {
///     Some(claims) => ctx.text(200, claims.subject().unwrap_or_default().to_string()),
///     None => ctx.status(401),
/// });
/// ```
#[derive(Clone)]
pub struct JwtMiddleware {
    key: DecodingKey,
    validation: Validation,
}

impl JwtMiddleware {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self::from_config(&JwtConfig::new(issuer, audience, secret))
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = config.leeway;

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token (without the `Bearer ` prefix)
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)?;
        Ok(Claims::new(data.claims))
    }
}

impl Middleware for JwtMiddleware {
    fn handle(&self, ctx: &Context) {
        let Some(header) = ctx.headers().get(hyper::header::AUTHORIZATION) else {
            return;
        };

        let verified = header
            .to_str()
            .map_err(|_| "authorization header is not valid text".to_string())
            .and_then(|value| {
                let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
                self.verify(token).map_err(|err| err.to_string())
            });

        match verified {
            Ok(claims) => {
                tracing::debug!(subject = claims.subject(), "verified bearer token");
                ctx.insert(claims);
            }
            Err(reason) => {
                tracing::debug!(path = ctx.path(), %reason, "rejected bearer token");
                ctx.abort_with(FrameworkError::unauthorized("invalid token"));
            }
        }
    }
}
