//! Error types for the surveyflow library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using surveyflow's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the I/O and configuration boundary.
///
/// The validators and the score engine never fail; problems they find are
/// reported as data. These variants cover loading inputs and rendering output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Input file extension is not JSON or TOML.
    #[error("Unsupported input format for file: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Survey has blocking errors (for CI/CD integration).
    #[error("Survey cannot be published: {error_count} blocking error(s)")]
    PublishBlocked { error_count: usize },
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a publish-blocked error.
    pub fn publish_blocked(error_count: usize) -> Self {
        Self::PublishBlocked { error_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("bad rollup");
        assert_eq!(err.to_string(), "Configuration error: bad rollup");

        let err = Error::FileNotFound {
            path: PathBuf::from("survey.json"),
        };
        assert_eq!(err.to_string(), "File not found: survey.json");
    }

    #[test]
    fn test_publish_blocked() {
        let err = Error::publish_blocked(3);
        match err {
            Error::PublishBlocked { error_count } => assert_eq!(error_count, 3),
            _ => panic!("Expected PublishBlocked"),
        }
        assert!(Error::publish_blocked(2).to_string().contains("2 blocking"));
    }
}
