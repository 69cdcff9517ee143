//! Error types for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unknown configuration format
    #[error("unknown configuration format for {path}\nSupported formats: .toml, .yml, .yaml, .json")]
    UnknownFormat { path: PathBuf },

    /// Parse error with the originating file
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// IO error
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Validation failed for a specific field
    #[error("invalid configuration: {field}: {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
