//! Validated identifiers supplied by the operator.
//!
//! Both names end up in URLs and in the manifest, so they are restricted to a
//! conservative slug alphabet: ASCII letters and digits with optional internal
//! hyphens.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;

static ORGANIZATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?$")
        .expect("organization name pattern is a valid regex")
});

static INSTANCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("instance name pattern is a valid regex")
});

/// Validated GitHub organization name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrganizationName(String);

impl OrganizationName {
    /// Create a new organization name with validation
    ///
    /// Surrounding whitespace is trimmed; case is preserved.
    ///
    /// # Errors
    /// Returns `ValidationError` if the name is empty or not a slug
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();

        if name.is_empty() {
            return Err(ValidationError::empty_field("organization name"));
        }

        if !ORGANIZATION_PATTERN.is_match(name) {
            return Err(ValidationError::invalid_format(
                "organization name",
                "use letters, numbers and hyphens, not starting or ending with a hyphen",
            ));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OrganizationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Label that tells several runner installations of one organization apart,
/// e.g. `prod` or `gpu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceName(String);

impl InstanceName {
    /// Create a new instance name with validation
    ///
    /// The input is trimmed and lowercased before it is checked.
    ///
    /// # Errors
    /// Returns `ValidationError` if the name is empty or not a lowercase slug
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim().to_lowercase();

        if name.is_empty() {
            return Err(ValidationError::empty_field("instance name"));
        }

        if !INSTANCE_PATTERN.is_match(&name) {
            return Err(ValidationError::invalid_format(
                "instance name",
                "use lowercase letters, numbers, hyphens",
            ));
        }

        Ok(Self(name))
    }

    /// Parses an optional answer; blank input means "no instance".
    pub fn parse_optional(name: &str) -> Result<Option<Self>, ValidationError> {
        if name.trim().is_empty() {
            Ok(None)
        } else {
            Self::new(name).map(Some)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InstanceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
