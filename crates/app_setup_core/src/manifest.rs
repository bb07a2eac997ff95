//! GitHub App manifest construction.
//!
//! The manifest describes the app GitHub should create: its name, permissions and
//! where GitHub should send the browser once the operator confirms. The redirect
//! and callback URLs always point at the local callback server.

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

use crate::{
    errors::SetupError,
    names::{InstanceName, OrganizationName},
};

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;

/// Homepage used for the app when none is configured.
pub const DEFAULT_HOMEPAGE_URL: &str = "https://github.com/bauer-group/CI-GitHubRunner";

const APP_NAME_PREFIX: &str = "Self-Hosted Runner";

const DESCRIPTION_SUFFIX: &str =
    "Ephemeral runners with Docker-in-Docker isolation for secure CI/CD builds.";

/// Permissions the runner app requests, as `(permission, access)` pairs.
pub const RUNNER_PERMISSIONS: [(&str, &str); 2] = [
    ("organization_self_hosted_runners", "write"),
    ("administration", "write"),
];

/// Webhook settings of the manifest. The runner app does not consume webhooks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HookAttributes {
    pub url: String,
    pub active: bool,
}

/// A GitHub App manifest as accepted by `/settings/apps/new`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppManifest {
    pub name: String,
    pub description: String,
    pub url: String,
    pub hook_attributes: HookAttributes,
    pub redirect_url: String,
    pub callback_urls: Vec<String>,
    pub public: bool,
    pub default_permissions: BTreeMap<String, String>,
    pub default_events: Vec<String>,
}

impl AppManifest {
    /// Builds the manifest for a private, organization owned runner app.
    ///
    /// # Arguments
    ///
    /// * `org` - The organization the app is created in.
    /// * `instance` - Optional label distinguishing several runner setups.
    /// * `callback_url` - Externally reachable callback URL of the local server.
    /// * `homepage_url` - Homepage shown on the app's public page.
    pub fn build(
        org: &OrganizationName,
        instance: Option<&InstanceName>,
        callback_url: &Url,
        homepage_url: &str,
    ) -> Self {
        let description = match instance {
            Some(instance) => format!(
                "Self-hosted GitHub Actions Runner ({}). {}",
                instance, DESCRIPTION_SUFFIX
            ),
            None => format!("Self-hosted GitHub Actions Runner. {}", DESCRIPTION_SUFFIX),
        };

        let default_permissions = RUNNER_PERMISSIONS
            .iter()
            .map(|(permission, access)| (permission.to_string(), access.to_string()))
            .collect();

        Self {
            name: app_name(org, instance),
            description,
            url: homepage_url.to_string(),
            hook_attributes: HookAttributes {
                url: homepage_url.to_string(),
                active: false,
            },
            redirect_url: callback_url.to_string(),
            callback_urls: vec![callback_url.to_string()],
            public: false,
            default_permissions,
            default_events: Vec::new(),
        }
    }

    /// Serializes the manifest to compact JSON.
    pub fn to_json(&self) -> Result<String, SetupError> {
        serde_json::to_string(self).map_err(|e| SetupError::Render(e.to_string()))
    }
}

/// Display name of the app: the instance label when given, otherwise the organization.
pub fn app_name(org: &OrganizationName, instance: Option<&InstanceName>) -> String {
    match instance {
        Some(instance) => format!("{} - {}", APP_NAME_PREFIX, instance),
        None => format!("{} - {}", APP_NAME_PREFIX, org),
    }
}

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, SetupError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SetupError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `<web>/organizations/<org>/settings/apps/new`, the form the manifest is posted to.
pub fn new_app_form_url(web_base: &Url, org: &OrganizationName) -> Result<Url, SetupError> {
    with_segments(
        web_base,
        &["organizations", org.as_str(), "settings", "apps", "new"],
    )
}

/// `<web>/organizations/<org>/settings/apps/<slug>`
pub fn app_settings_url(
    web_base: &Url,
    org: &OrganizationName,
    slug: &str,
) -> Result<Url, SetupError> {
    with_segments(
        web_base,
        &["organizations", org.as_str(), "settings", "apps", slug],
    )
}

/// `<web>/organizations/<org>/settings/apps/<slug>/installations`
pub fn app_installations_url(
    web_base: &Url,
    org: &OrganizationName,
    slug: &str,
) -> Result<Url, SetupError> {
    with_segments(
        web_base,
        &[
            "organizations",
            org.as_str(),
            "settings",
            "apps",
            slug,
            "installations",
        ],
    )
}
