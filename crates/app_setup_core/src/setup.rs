//! One run of the app setup flow.
//!
//! [`AppSetup::run`] walks through the flow in order: bind the callback server,
//! build the manifest and the redirect page, wait for GitHub's callback, then hand
//! the code to [`AppSetup::complete`], which exchanges it and writes the key and the
//! `.env` file. Progress is reported to a [`SetupObserver`] so the caller decides how
//! it is shown.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use config_manager::{AppEnvSettings, EnvFileUpdater, EnvUpdateReport};
use github_client::{AppCredentials, CredentialExchange};
use tracing::{info, instrument};
use url::Url;

use crate::{
    callback_server::{CallbackServer, DEFAULT_CALLBACK_PORT},
    errors::SetupError,
    key_store::{KeyStore, SavedKey, DEFAULT_KEY_FILE_NAME},
    manifest::{
        app_installations_url, app_name, app_settings_url, new_app_form_url, AppManifest,
        DEFAULT_HOMEPAGE_URL,
    },
    names::{InstanceName, OrganizationName},
    page::{render_redirect_page, render_success_page},
};

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;

/// Base URL of the GitHub web UI.
pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";

/// Host name the browser uses to reach the callback server.
pub const DEFAULT_PUBLIC_HOST: &str = "localhost";

/// How long to wait for GitHub's callback.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_ENV_FILE_NAME: &str = ".env";
pub const DEFAULT_ENV_TEMPLATE_NAME: &str = ".env.example";

/// Settings for a single setup run.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub organization: OrganizationName,
    pub instance: Option<InstanceName>,

    /// Directory the key and the `.env` file are written to.
    pub project_dir: PathBuf,

    /// Local address the callback server listens on.
    pub bind_addr: SocketAddr,

    /// Host name used in the callback URL registered with GitHub.
    pub public_host: String,
    pub callback_timeout: Duration,
    pub web_base_url: String,
    pub homepage_url: String,
    pub key_file_name: String,
    pub env_file_name: String,
    pub env_template_name: String,
}

impl SetupOptions {
    /// Options with the default port, timeout, URLs and file names.
    pub fn new(
        organization: OrganizationName,
        instance: Option<InstanceName>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            organization,
            instance,
            project_dir: project_dir.into(),
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_CALLBACK_PORT)),
            public_host: DEFAULT_PUBLIC_HOST.to_string(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            homepage_url: DEFAULT_HOMEPAGE_URL.to_string(),
            key_file_name: DEFAULT_KEY_FILE_NAME.to_string(),
            env_file_name: DEFAULT_ENV_FILE_NAME.to_string(),
            env_template_name: DEFAULT_ENV_TEMPLATE_NAME.to_string(),
        }
    }

    pub fn env_path(&self) -> PathBuf {
        self.project_dir.join(&self.env_file_name)
    }

    pub fn env_template_path(&self) -> PathBuf {
        self.project_dir.join(&self.env_template_name)
    }
}

/// Receives progress notifications during a run.
///
/// All methods default to doing nothing.
pub trait SetupObserver: Send + Sync {
    /// The callback server is serving; `start_url` opens the redirect page.
    fn server_started(&self, _start_url: &Url) {}

    fn code_received(&self) {}

    fn exchanging_code(&self) {}

    /// GitHub created the app. `slug` already has the fallback applied.
    fn credentials_received(&self, _credentials: &AppCredentials, _slug: &str) {}

    fn key_saved(&self, _key: &SavedKey) {}

    fn config_updated(&self, _report: &EnvUpdateReport) {}
}

/// An observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl SetupObserver for SilentObserver {}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub app_id: u64,
    pub slug: String,
    pub key: SavedKey,
    pub env: EnvUpdateReport,

    /// Where the operator installs the app into the organization.
    pub installations_url: Url,
    pub settings_url: Url,
}

/// Drives the manifest flow for one organization.
pub struct AppSetup<E: CredentialExchange> {
    options: SetupOptions,
    exchange: E,
}

impl<E: CredentialExchange> AppSetup<E> {
    pub fn new(options: SetupOptions, exchange: E) -> Self {
        Self { options, exchange }
    }

    pub fn options(&self) -> &SetupOptions {
        &self.options
    }

    /// Name the app is created with.
    pub fn app_name(&self) -> String {
        app_name(&self.options.organization, self.options.instance.as_ref())
    }

    fn web_base_url(&self) -> Result<Url, SetupError> {
        Url::parse(&self.options.web_base_url)
            .map_err(|e| SetupError::InvalidUrl(format!("{}: {}", self.options.web_base_url, e)))
    }

    /// Runs the whole flow, from binding the callback server to updating `.env`.
    ///
    /// # Errors
    ///
    /// - `SetupError::ServerBind` if the callback port is taken.
    /// - `SetupError::CallbackTimeout` if GitHub never redirected back in time.
    /// - Any error of [`AppSetup::complete`].
    #[instrument(skip(self, observer), fields(org = %self.options.organization))]
    pub async fn run(&self, observer: &dyn SetupObserver) -> Result<SetupOutcome, SetupError> {
        let web_base = self.web_base_url()?;
        let server =
            CallbackServer::bind(self.options.bind_addr, &self.options.public_host).await?;

        let manifest = AppManifest::build(
            &self.options.organization,
            self.options.instance.as_ref(),
            &server.callback_url(),
            &self.options.homepage_url,
        );
        let form_action = new_app_form_url(&web_base, &self.options.organization)?;
        let redirect_page = render_redirect_page(&manifest, &form_action)?;
        let success_page = render_success_page()?;

        let running = server.start(redirect_page, success_page);
        info!(
            message = "Waiting for GitHub callback",
            url = %running.start_url(),
            timeout_secs = self.options.callback_timeout.as_secs()
        );
        observer.server_started(running.start_url());

        let code = running
            .wait_for_code(self.options.callback_timeout)
            .await?;
        observer.code_received();

        self.complete(&code, observer).await
    }

    /// Exchanges `code` for the app's credentials and persists them.
    ///
    /// # Errors
    ///
    /// - `SetupError::Exchange` or `SetupError::InvalidCredentials` if GitHub
    ///   did not hand out usable credentials. Nothing is written in that case.
    /// - `SetupError::KeyStore` if the key cannot be written.
    /// - `SetupError::Config` if the `.env` file cannot be updated.
    #[instrument(skip(self, code, observer), fields(org = %self.options.organization))]
    pub async fn complete(
        &self,
        code: &str,
        observer: &dyn SetupObserver,
    ) -> Result<SetupOutcome, SetupError> {
        let web_base = self.web_base_url()?;

        observer.exchanging_code();
        let credentials = self.exchange.exchange_code(code).await?;

        let fallback = self.app_name();
        let slug = credentials.slug_or(&fallback).to_string();
        info!(message = "GitHub App created", app_id = credentials.id, slug = %slug);
        observer.credentials_received(&credentials, &slug);

        let key = KeyStore::new(&self.options.project_dir, &self.options.key_file_name)
            .save_private_key(&credentials.pem)?;
        observer.key_saved(&key);

        let settings = AppEnvSettings::for_organization(
            credentials.id,
            self.options.organization.as_str(),
            &key.path,
        );
        let env = EnvFileUpdater::new(self.options.env_path(), self.options.env_template_path())
            .apply(&settings)?;
        observer.config_updated(&env);

        Ok(SetupOutcome {
            app_id: credentials.id,
            installations_url: app_installations_url(
                &web_base,
                &self.options.organization,
                &slug,
            )?,
            settings_url: app_settings_url(&web_base, &self.options.organization, &slug)?,
            slug,
            key,
            env,
        })
    }
}
