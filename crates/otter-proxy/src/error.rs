//! Proxy error types

use crate::key::PropertyKey;
use thiserror::Error;

/// Errors raised by handle operations, traps, and configuration loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProxyError {
    /// A `set` trap rejected the value written to `key`
    #[error("ValidationFailed: value rejected for property '{key}'")]
    ValidationFailed {
        /// Property that was being written
        key: PropertyKey,
    },

    /// A trap refused access to a protected property
    #[error("AccessDenied: property '{key}' is protected")]
    AccessDenied {
        /// Property that was accessed
        key: PropertyKey,
    },

    /// Invocation of a value that is not a function
    #[error("TypeError: {0} is not a function")]
    NotCallable(String),

    /// Operation attempted on a revoked handle
    #[error("TypeError: Cannot perform '{operation}' on a revoked proxy")]
    Revoked {
        /// Operation kind that was attempted
        operation: &'static str,
    },

    /// Shape mismatch between an operation and its target
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid configuration
    #[error("ConfigError: {0}")]
    Config(String),

    /// Error raised by a user function or trap
    #[error("Uncaught exception: {0}")]
    Thrown(String),
}

impl ProxyError {
    /// Create a validation failure for `key`
    pub fn validation_failed(key: impl Into<PropertyKey>) -> Self {
        Self::ValidationFailed { key: key.into() }
    }

    /// Create an access denial for `key`
    pub fn access_denied(key: impl Into<PropertyKey>) -> Self {
        Self::AccessDenied { key: key.into() }
    }

    /// Create a not-callable error
    pub fn not_callable(what: impl Into<String>) -> Self {
        Self::NotCallable(what.into())
    }

    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an error carrying an arbitrary thrown message
    pub fn thrown(msg: impl Into<String>) -> Self {
        Self::Thrown(msg.into())
    }

    /// Whether this error is an access denial
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Whether this error is a validation failure
    pub fn is_validation_failed(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }
}

impl From<toml::de::Error> for ProxyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<regex::Error> for ProxyError {
    fn from(err: regex::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for proxy operations
pub type ProxyResult<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProxyError::access_denied("_password");
        assert_eq!(err.to_string(), "AccessDenied: property '_password' is protected");
        assert!(err.is_access_denied());

        let err = ProxyError::validation_failed(2u32);
        assert_eq!(err.to_string(), "ValidationFailed: value rejected for property '2'");
        assert!(err.is_validation_failed());

        let err = ProxyError::Revoked { operation: "get" };
        assert_eq!(err.to_string(), "TypeError: Cannot perform 'get' on a revoked proxy");
    }
}
