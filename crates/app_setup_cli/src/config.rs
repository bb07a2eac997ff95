//! Settings file for the setup CLI.
//!
//! Everything in here has a sensible default, so the file is optional. It exists
//! for forks of the runner project (different homepage), GitHub Enterprise
//! (different API and web URLs) and hosts where port 8765 is taken.

use std::{
    fs,
    path::{Path, PathBuf},
};

use app_setup_core::{
    manifest::DEFAULT_HOMEPAGE_URL,
    setup::{DEFAULT_ENV_FILE_NAME, DEFAULT_ENV_TEMPLATE_NAME, DEFAULT_WEB_BASE_URL},
    DEFAULT_CALLBACK_PORT,
};
use github_client::{DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Error;

/// Default settings file name
pub const DEFAULT_CONFIG_FILENAME: &str = "setup-github-app.toml";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Settings of the setup tool.
///
/// # Example TOML Configuration
///
/// ```toml
/// port = 9000
/// callback_timeout_secs = 600
/// api_base_url = "https://ghe.example.com/api/v3"
/// web_base_url = "https://ghe.example.com"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Local port of the callback server.
    #[serde(default = "SetupConfig::default_port")]
    pub port: u16,

    /// How long to wait for GitHub's callback, in seconds.
    #[serde(default = "SetupConfig::default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,

    #[serde(default = "SetupConfig::default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "SetupConfig::default_web_base_url")]
    pub web_base_url: String,

    /// Homepage registered for the app.
    #[serde(default = "SetupConfig::default_homepage_url")]
    pub homepage_url: String,

    #[serde(default = "SetupConfig::default_user_agent")]
    pub user_agent: String,

    #[serde(default = "SetupConfig::default_key_file_name")]
    pub key_file_name: String,

    #[serde(default = "SetupConfig::default_env_file_name")]
    pub env_file_name: String,

    /// Template the `.env` file is created from when it does not exist.
    #[serde(default = "SetupConfig::default_env_template_name")]
    pub env_template_name: String,
}

impl SetupConfig {
    fn default_port() -> u16 {
        DEFAULT_CALLBACK_PORT
    }

    fn default_callback_timeout_secs() -> u64 {
        300
    }

    fn default_api_base_url() -> String {
        DEFAULT_API_BASE_URL.to_string()
    }

    fn default_web_base_url() -> String {
        DEFAULT_WEB_BASE_URL.to_string()
    }

    fn default_homepage_url() -> String {
        DEFAULT_HOMEPAGE_URL.to_string()
    }

    fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    fn default_key_file_name() -> String {
        app_setup_core::key_store::DEFAULT_KEY_FILE_NAME.to_string()
    }

    fn default_env_file_name() -> String {
        DEFAULT_ENV_FILE_NAME.to_string()
    }

    fn default_env_template_name() -> String {
        DEFAULT_ENV_TEMPLATE_NAME.to_string()
    }

    /// Loads settings from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read, or
    /// contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: SetupConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Loads settings from `path`, falling back to the defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, Error> {
        if path.exists() {
            let config = Self::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            debug!("No configuration file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            callback_timeout_secs: Self::default_callback_timeout_secs(),
            api_base_url: Self::default_api_base_url(),
            web_base_url: Self::default_web_base_url(),
            homepage_url: Self::default_homepage_url(),
            user_agent: Self::default_user_agent(),
            key_file_name: Self::default_key_file_name(),
            env_file_name: Self::default_env_file_name(),
            env_template_name: Self::default_env_template_name(),
        }
    }
}

/// Resolves the settings file path, defaulting to the current directory.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
