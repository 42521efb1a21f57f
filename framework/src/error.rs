//! Framework-wide error types
//!
//! Three kinds of errors live here:
//! - [`ContainerError`]: registration, resolution and invocation failures of the
//!   dependency injection container. Always returned as values.
//! - [`FrameworkError`]: HTTP-facing errors raised while serving a request. Each
//!   variant maps to a status code and converts into a JSON error response.
//! - [`ConfigError`]: required configuration that is missing or unparsable.

use thiserror::Error;

/// Errors produced by the dependency injection container
///
/// # Example
///
/// ```rust
/// use satchel::{Container, ContainerError};
///
/// let container = Container::new();
/// container.add_singleton(42u32).unwrap();
///
/// let err = container.add_singleton(7u32).unwrap_err();
/// assert!(matches!(err, ContainerError::TypeAlreadyRegistered { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// A provider already exists for the type. The registration had no effect.
    #[error("type '{type_name}' already registered")]
    TypeAlreadyRegistered {
        /// The type name of the conflicting registration
        type_name: &'static str,
    },

    /// Resolution or invocation requested a type without a provider
    #[error("type '{type_name}' not registered")]
    TypeNotRegistered {
        /// The type name that could not be resolved
        type_name: &'static str,
    },

    /// A transient factory value is not a callable producing exactly one value
    #[error("invalid factory: {reason}")]
    InvalidFactory {
        /// Why the factory was rejected
        reason: &'static str,
    },

    /// The invocation target is not a callable value
    #[error("not invokable")]
    NotInvokable,

    /// An explicitly supplied argument does not fit the callable's signature
    #[error("argument {index} mismatch: expected {expected}")]
    ArgumentMismatch {
        /// Zero-based parameter position
        index: usize,
        /// Type name the callable declares at that position
        expected: &'static str,
    },
}

impl ContainerError {
    /// Create a TypeAlreadyRegistered error for a given type
    pub fn already_registered<T: ?Sized>() -> Self {
        Self::TypeAlreadyRegistered {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a TypeNotRegistered error for a given type
    pub fn not_registered<T: ?Sized>() -> Self {
        Self::TypeNotRegistered {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Framework-wide error type for request handling
///
/// Handlers and middleware return this from fallible context helpers so the
/// `?` operator can be used, then turn it into a response with
/// [`Context::fail`](crate::http::Context::fail).
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// The container failed to build the handler's invocation frame
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Route parameter missing
    #[error("Missing required parameter: {param_name}")]
    ParamError {
        /// The name of the parameter that was not present
        param_name: String,
    },

    /// Request body could not be read or decoded
    #[error("Invalid request body: {message}")]
    Body {
        /// Decoder error message
        message: String,
    },

    /// Missing or unverifiable credentials (401)
    #[error("{message}")]
    Unauthorized {
        /// The error message
        message: String,
    },

    /// Credentials lack the required permissions (403)
    #[error("forbidden")]
    Forbidden,

    /// Generic internal server error
    #[error("Internal server error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl FrameworkError {
    /// Create a ParamError for a missing parameter
    pub fn param(name: impl Into<String>) -> Self {
        Self::ParamError {
            param_name: name.into(),
        }
    }

    /// Create a Body error
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: message.into(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Container(_) => 500,
            Self::ParamError { .. } => 400,
            Self::Body { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden => 403,
            Self::Internal { .. } => 500,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("required environment variable {key} is not set")]
    Missing { key: String },

    /// An environment variable is set but cannot be parsed
    #[error("environment variable {key} has an invalid value")]
    Invalid { key: String },
}
