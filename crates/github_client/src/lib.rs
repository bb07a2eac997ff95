//! Crate for interacting with the GitHub REST API during app registration.
//!
//! GitHub's manifest flow ends with a one-time code. This crate converts that code
//! into the credentials of the newly created GitHub App by calling
//! `POST /app-manifests/{code}/conversions`. The endpoint needs no authentication;
//! possession of the code is the proof.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, error, info, instrument};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::AppCredentials;

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Base URL of the public GitHub REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Media type GitHub recommends for REST API requests.
pub const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// User agent sent with every request. GitHub rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = "GitHub-App-Setup-Tool";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts a manifest code into GitHub App credentials.
///
/// Implemented by [`ManifestConversionClient`]; the setup flow depends on this trait so
/// it can be driven without a network connection.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Exchanges the one-time `code` for the credentials of the created app.
    async fn exchange_code(&self, code: &str) -> Result<AppCredentials, Error>;
}

/// A client for the GitHub app manifest conversion endpoint.
#[derive(Debug, Clone)]
pub struct ManifestConversionClient {
    client: reqwest::Client,
    api_base: Url,
}

impl ManifestConversionClient {
    /// Creates a client that talks to the API rooted at `api_base_url`.
    ///
    /// # Arguments
    ///
    /// * `api_base_url` - Root of the REST API, e.g. `https://api.github.com`.
    /// * `user_agent` - Value for the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if `api_base_url` is not an absolute URL, or
    /// `Error::Network` if the underlying HTTP client cannot be built.
    pub fn new(api_base_url: &str, user_agent: &str) -> Result<Self, Error> {
        let api_base = Url::parse(api_base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", api_base_url, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(Error::InvalidUrl(api_base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, api_base })
    }

    /// Builds the conversion URL for `code`.
    ///
    /// The code is added as a single path segment, so any reserved characters in it
    /// are percent-encoded rather than interpreted as path separators.
    pub fn conversion_url(&self, code: &str) -> Result<Url, Error> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["app-manifests", code, "conversions"]);
        Ok(url)
    }
}

#[async_trait]
impl CredentialExchange for ManifestConversionClient {
    /// Exchanges the manifest code for app credentials.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyCode` if `code` is empty; no request is sent.
    /// - `Error::Network` if the request fails before a response arrives.
    /// - `Error::Api` if GitHub answers with a non-success status. The status and
    ///   body are passed through unchanged.
    /// - `Error::Deserialization` if a success body is not JSON.
    /// - `Error::InvalidResponse` if a success body lacks the app ID or private key.
    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<AppCredentials, Error> {
        if code.is_empty() {
            error!("Refusing to exchange an empty manifest code");
            return Err(Error::EmptyCode);
        }

        let url = self.conversion_url(code)?;
        debug!(host = url.host_str(), "Requesting manifest conversion");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, GITHUB_JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Manifest conversion request failed");
                Error::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Failed to read the conversion response body");
            Error::Network(e.to_string())
        })?;

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                "GitHub rejected the manifest conversion"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let conversion: models::ManifestConversion = serde_json::from_str(&body)?;
        let credentials = AppCredentials::try_from(conversion)?;

        info!(
            app_id = credentials.id,
            slug = credentials.slug.as_deref(),
            "Converted manifest code into app credentials"
        );
        Ok(credentials)
    }
}
