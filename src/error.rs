//! Error types for limiter configuration and header emission.
//!
//! The admission path itself is total: `check`, `peek`, `limit` and `reset`
//! never fail. A rejected request is an ordinary [`AdmissionResult`] with
//! `allowed == false`, not an error. Errors only arise while validating
//! configuration or when a header sink refuses a header.
//!
//! [`AdmissionResult`]: crate::decision::AdmissionResult

use thiserror::Error;

/// Result type for fallible limiter operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Main error type of the crate.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Header emission error.
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),
}

/// Configuration-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The window duration is zero.
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Missing required configuration.
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Errors raised by a header sink that cannot hold a header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The header name is not valid for the sink.
    #[error("Invalid header name: {0}")]
    InvalidName(String),

    /// The header value is not valid for the sink.
    #[error("Invalid value for header {name}: {value}")]
    InvalidValue {
        /// Header name.
        name: String,
        /// Rejected value.
        value: String,
    },
}

impl HeaderError {
    /// Create an invalid value error.
    pub fn invalid_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err =
            AdmissionError::from(ConfigError::InvalidWindow("window must be non-zero".into()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid window: window must be non-zero"
        );

        let err = AdmissionError::from(HeaderError::invalid_value("X-RateLimit-Limit", "\n"));
        assert!(err.to_string().contains("X-RateLimit-Limit"));
    }

    #[test]
    fn test_missing_required_display() {
        let err = ConfigError::MissingRequired("window".into());
        assert_eq!(err.to_string(), "Missing required configuration: window");
    }
}
