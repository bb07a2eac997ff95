//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when converting an app manifest
//! code into GitHub App credentials. The variants keep network failures, API failures
//! and malformed responses apart so callers can report each one distinctly.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.exchange_code(&code).await {
///     Ok(credentials) => println!("App created: {}", credentials.id),
///     Err(Error::Api { status, body }) => eprintln!("GitHub said {status}: {body}"),
///     Err(err) => eprintln!("Other error: {err}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The GitHub API answered with a non-success status code.
    ///
    /// The status code and the raw response body are kept verbatim so the
    /// operator sees exactly what GitHub reported.
    #[error("GitHub API error: {status} - {body}")]
    Api {
        /// HTTP status code returned by GitHub
        status: u16,
        /// Response body returned by GitHub
        body: String,
    },

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The manifest code was empty, so no request was sent.
    #[error("The manifest code must not be empty")]
    EmptyCode,

    /// A configured URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// GitHub answered with a success status but the body lacked the app ID or the private key.
    #[error("Invalid response from GitHub API: {0}")]
    InvalidResponse(String),

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("Network error while contacting GitHub: {0}")]
    Network(String),
}
