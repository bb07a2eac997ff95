//! Configuration file error types.
//!
//! Domain-specific errors for reading, patching and writing flat
//! `KEY=value` configuration files.

use std::path::Path;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Configuration file errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Failed to access configuration file: {path} - {reason}")]
    FileAccessError { path: String, reason: String },

    #[error("Invalid configuration key: '{key}'")]
    InvalidKey { key: String },
}

impl ConfigurationError {
    /// Wraps an I/O failure on `path`.
    pub fn file_access(path: &Path, err: std::io::Error) -> Self {
        Self::FileAccessError {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
