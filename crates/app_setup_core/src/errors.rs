//! Error types for the app setup flow.
//!
//! Validation failures are raised before anything touches the network or the
//! filesystem. Every other variant ends the current run; the operator is expected
//! to fix the cause and run the tool again.

use std::{net::SocketAddr, time::Duration};

use config_manager::ConfigurationError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// An operator supplied identifier failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    EmptyField { field: String },

    #[error("Invalid {field} format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: &str) -> Self {
        Self::EmptyField {
            field: field.to_string(),
        }
    }

    pub fn invalid_format(field: &str, reason: &str) -> Self {
        Self::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that end a setup run.
#[derive(Error, Debug)]
pub enum SetupError {
    /// An identifier was rejected before any side effects happened.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The local callback server could not listen on its port.
    #[error("Failed to start the callback server on {addr}: {reason}")]
    ServerBind { addr: SocketAddr, reason: String },

    /// The callback server stopped unexpectedly.
    #[error("Callback server failed: {0}")]
    Server(String),

    /// No callback carrying a code arrived within the wait bound.
    #[error("Timeout waiting for callback after {} seconds. Please try again.", .0.as_secs())]
    CallbackTimeout(Duration),

    /// The code could not be exchanged for credentials.
    #[error("Failed to get credentials: {0}")]
    Exchange(github_client::Error),

    /// GitHub answered the exchange successfully but without the app ID or key.
    #[error("Invalid response from GitHub API: {0}")]
    InvalidCredentials(String),

    /// The private key could not be written.
    #[error("Failed to save the private key to {path}: {reason}")]
    KeyStore { path: String, reason: String },

    /// The configuration file could not be updated.
    #[error("Failed to update the configuration file: {0}")]
    Config(#[from] ConfigurationError),

    /// An HTML page could not be rendered.
    #[error("Failed to render page: {0}")]
    Render(String),

    /// A configured URL could not be parsed or extended.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<github_client::Error> for SetupError {
    fn from(value: github_client::Error) -> Self {
        match value {
            github_client::Error::InvalidResponse(reason) => SetupError::InvalidCredentials(reason),
            other => SetupError::Exchange(other),
        }
    }
}
