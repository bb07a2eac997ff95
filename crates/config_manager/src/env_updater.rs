//! Applies GitHub App credentials to a project's `.env` file.
//!
//! The updater makes sure the file exists (seeding it from a template when one is
//! present), upserts the app settings and comments out any personal access token
//! assignment, since app authentication replaces it. Lines the updater does not
//! own are written back untouched.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, instrument, warn};

use crate::{
    env_file::{EnvFile, UpsertOutcome},
    errors::{ConfigurationError, ConfigurationResult},
};

#[cfg(test)]
#[path = "env_updater_tests.rs"]
mod tests;

pub const APP_ID_KEY: &str = "APP_ID";
pub const APP_LOGIN_KEY: &str = "APP_LOGIN";
pub const APP_PRIVATE_KEY_FILE_KEY: &str = "APP_PRIVATE_KEY_FILE";
pub const RUNNER_SCOPE_KEY: &str = "RUNNER_SCOPE";
pub const ORG_NAME_KEY: &str = "ORG_NAME";

/// Personal access token setting superseded by app authentication.
pub const LEGACY_TOKEN_KEY: &str = "GITHUB_ACCESS_TOKEN";

/// Content written when neither the file nor a template exists.
pub const DEFAULT_ENV_CONTENT: &str = "# GitHub Runner Configuration\n";

/// Runner scope used for organization-level apps.
pub const ORG_RUNNER_SCOPE: &str = "org";

/// The settings written for a newly created GitHub App.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEnvSettings {
    pub app_id: u64,
    pub login: String,
    pub private_key_file: PathBuf,
    pub runner_scope: String,
    pub org_name: String,
}

impl AppEnvSettings {
    /// Settings for an app owned by organization `org`.
    pub fn for_organization(app_id: u64, org: &str, private_key_file: &Path) -> Self {
        Self {
            app_id,
            login: org.to_string(),
            private_key_file: private_key_file.to_path_buf(),
            runner_scope: ORG_RUNNER_SCOPE.to_string(),
            org_name: org.to_string(),
        }
    }

    /// The assignments in the order they are applied.
    pub fn assignments(&self) -> Vec<(&'static str, String)> {
        vec![
            (APP_ID_KEY, self.app_id.to_string()),
            (APP_LOGIN_KEY, self.login.clone()),
            (
                APP_PRIVATE_KEY_FILE_KEY,
                self.private_key_file.display().to_string(),
            ),
            (RUNNER_SCOPE_KEY, self.runner_scope.clone()),
            (ORG_NAME_KEY, self.org_name.clone()),
        ]
    }
}

/// How the `.env` file came to exist before it was updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileOrigin {
    Existing,
    CopiedFromTemplate,
    CreatedWithDefaults,
}

/// Summary of a completed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvUpdateReport {
    pub path: PathBuf,
    pub origin: EnvFileOrigin,
    pub changes: Vec<(&'static str, UpsertOutcome)>,
    pub legacy_tokens_disabled: usize,
}

/// Updates a `.env` file in place.
#[derive(Debug, Clone)]
pub struct EnvFileUpdater {
    env_path: PathBuf,
    template_path: PathBuf,
}

impl EnvFileUpdater {
    /// Creates an updater for `env_path`, seeded from `template_path` when the former is missing.
    pub fn new(env_path: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            env_path: env_path.into(),
            template_path: template_path.into(),
        }
    }

    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    /// Creates the `.env` file if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::FileAccessError` if the template cannot be copied
    /// or the default file cannot be written.
    pub fn ensure_exists(&self) -> ConfigurationResult<EnvFileOrigin> {
        if self.env_path.exists() {
            return Ok(EnvFileOrigin::Existing);
        }

        if self.template_path.is_file() {
            fs::copy(&self.template_path, &self.env_path)
                .map_err(|e| ConfigurationError::file_access(&self.template_path, e))?;
            info!(
                template = ?self.template_path,
                path = ?self.env_path,
                "Created configuration file from template"
            );
            return Ok(EnvFileOrigin::CopiedFromTemplate);
        }

        fs::write(&self.env_path, DEFAULT_ENV_CONTENT)
            .map_err(|e| ConfigurationError::file_access(&self.env_path, e))?;
        info!(path = ?self.env_path, "Created configuration file with default content");
        Ok(EnvFileOrigin::CreatedWithDefaults)
    }

    /// Writes `settings` into the `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::FileAccessError` if the file cannot be created,
    /// read or written.
    #[instrument(skip(self, settings), fields(path = ?self.env_path))]
    pub fn apply(&self, settings: &AppEnvSettings) -> ConfigurationResult<EnvUpdateReport> {
        let origin = self.ensure_exists()?;

        let content = fs::read_to_string(&self.env_path)
            .map_err(|e| ConfigurationError::file_access(&self.env_path, e))?;
        let mut env = EnvFile::parse(&content);

        let mut changes = Vec::new();
        for (key, value) in settings.assignments() {
            let outcome = env.upsert(key, &value)?;
            debug!(key = key, outcome = ?outcome, "Applied setting");
            changes.push((key, outcome));
        }

        let legacy_tokens_disabled = env.comment_out(LEGACY_TOKEN_KEY)?;
        if legacy_tokens_disabled > 0 {
            warn!(
                key = LEGACY_TOKEN_KEY,
                count = legacy_tokens_disabled,
                "Commented out personal access token, the GitHub App replaces it"
            );
        }

        fs::write(&self.env_path, env.render())
            .map_err(|e| ConfigurationError::file_access(&self.env_path, e))?;
        info!(path = ?self.env_path, "Configuration file updated");

        Ok(EnvUpdateReport {
            path: self.env_path.clone(),
            origin,
            changes,
            legacy_tokens_disabled,
        })
    }
}
