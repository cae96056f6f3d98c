//! Error handling for the ensemble combiner.

use thiserror::Error;

/// Main error type for the ensemble combiner
#[derive(Debug, Error)]
pub enum Error {
    /// No method results were supplied, so there is nothing to combine
    #[error("Empty ensemble: no method results to combine")]
    EmptyEnsemble,

    /// Constituent sequences disagree in length
    #[error("Length mismatch for method '{method}': expected {expected} items, found {found}")]
    LengthMismatch { method: String, expected: usize, found: usize },

    /// Weights do not cover exactly the methods present, or sum to <= 0
    #[error("Invalid weights: {0}")]
    InvalidWeight(String),

    /// Voting was requested but a method carries no per-item labels
    #[error("Method '{method}' has no per-item labels; voting requires labels")]
    MissingLabels { method: String },

    /// A detector or forecaster could not produce a result
    #[error("Method '{method}' failed: {reason}")]
    MethodFailed { method: String, reason: String },

    /// A detector was asked to score before it was fitted on a baseline
    #[error("Method '{method}' has no fitted baseline")]
    NotFitted { method: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for the ensemble combiner
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a length mismatch on a named method.
    pub(crate) fn length_mismatch(method: &str, expected: usize, found: usize) -> Self {
        Error::LengthMismatch { method: method.to_string(), expected, found }
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<statrs::StatsError> for Error {
    fn from(err: statrs::StatsError) -> Self {
        Error::InvalidArgument(format!("statistics error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_error = Error::ConfigError("missing field".to_string());
        assert_eq!(config_error.to_string(), "Configuration error: missing field");

        let mismatch = Error::length_mismatch("arima", 5, 4);
        assert_eq!(
            mismatch.to_string(),
            "Length mismatch for method 'arima': expected 5 items, found 4"
        );

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let wrapped_io_error = Error::from(io_error);
        assert!(wrapped_io_error.to_string().contains("I/O error"));

        let str_error = Error::from("custom error");
        assert_eq!(str_error.to_string(), "Error: custom error");
    }

    #[test]
    fn test_missing_labels_names_method() {
        let err = Error::MissingLabels { method: "z_score".into() };
        assert!(err.to_string().contains("z_score"));
    }
}
