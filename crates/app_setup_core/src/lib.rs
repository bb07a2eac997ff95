//! # App Setup Core
//!
//! This crate creates a GitHub App for self-hosted runners through GitHub's
//! manifest flow and wires the result into a local project.
//!
//! ## Overview
//!
//! A setup run:
//! 1. Validates the organization and the optional instance name
//! 2. Binds a local callback server and builds the app manifest around its URL
//! 3. Serves a page that posts the manifest to GitHub's new-app form
//! 4. Waits for GitHub to redirect back with a one-time code
//! 5. Exchanges the code for the app ID and private key
//! 6. Saves the key (backing up any previous one) and updates `.env`
//!
//! ## Examples
//!
//! ```no_run
//! use app_setup_core::{
//!     AppSetup, InstanceName, OrganizationName, SetupOptions, SilentObserver,
//! };
//! use github_client::{ManifestConversionClient, DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SetupOptions::new(
//!     OrganizationName::new("my-org")?,
//!     InstanceName::parse_optional("prod")?,
//!     ".",
//! );
//! let client = ManifestConversionClient::new(DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT)?;
//!
//! let outcome = AppSetup::new(options, client).run(&SilentObserver).await?;
//! println!("Install the app: {}", outcome.installations_url);
//! # Ok(())
//! # }
//! ```

pub mod callback_server;
pub mod errors;
pub mod key_store;
pub mod manifest;
pub mod names;
pub mod page;
pub mod setup;

pub use callback_server::{CallbackServer, RunningCallbackServer, DEFAULT_CALLBACK_PORT};
pub use errors::{SetupError, ValidationError};
pub use key_store::{KeyStore, SavedKey};
pub use manifest::AppManifest;
pub use names::{InstanceName, OrganizationName};
pub use setup::{AppSetup, SetupObserver, SetupOptions, SetupOutcome, SilentObserver};
