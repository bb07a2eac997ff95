//! Persistence of the app's private key.
//!
//! A key that is already on disk is never overwritten. It is renamed to a
//! timestamped backup first, so every previous key stays recoverable.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::errors::SetupError;

#[cfg(test)]
#[path = "key_store_tests.rs"]
mod tests;

/// File name of the private key unless configured otherwise.
pub const DEFAULT_KEY_FILE_NAME: &str = "github-app.pem";

/// Format of the timestamp appended to backup file names.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where a private key was written and what happened to the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedKey {
    pub path: PathBuf,

    /// The previous key file after it was moved aside, if there was one.
    pub backup: Option<PathBuf>,

    /// Whether owner-only permissions were applied to the new file.
    pub permissions_restricted: bool,
}

/// Writes private keys into a target directory.
#[derive(Debug, Clone)]
pub struct KeyStore {
    key_path: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            key_path: dir.as_ref().join(file_name),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Writes `pem` to the key path, backing up any existing file first.
    ///
    /// On Unix the new file is restricted to mode `0600`. Failing to do so is
    /// logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::KeyStore` if the backup or the write fails.
    #[instrument(skip(self, pem), fields(path = %self.key_path.display()))]
    pub fn save_private_key(&self, pem: &SecretString) -> Result<SavedKey, SetupError> {
        let backup = if self.key_path.exists() {
            Some(self.backup_existing()?)
        } else {
            None
        };

        fs::write(&self.key_path, pem.expose_secret()).map_err(|e| self.error(e))?;
        info!(message = "Private key saved", path = %self.key_path.display());

        let permissions_restricted = match restrict_permissions(&self.key_path) {
            Ok(restricted) => restricted,
            Err(e) => {
                warn!(
                    message = "Could not restrict permissions of the private key",
                    path = %self.key_path.display(),
                    error = %e
                );
                false
            }
        };

        Ok(SavedKey {
            path: self.key_path.clone(),
            backup,
            permissions_restricted,
        })
    }

    fn backup_existing(&self) -> Result<PathBuf, SetupError> {
        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup = self.free_backup_path(&timestamp);

        fs::rename(&self.key_path, &backup).map_err(|e| SetupError::KeyStore {
            path: backup.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(
            message = "Existing private key backed up",
            backup = %backup.display()
        );
        Ok(backup)
    }

    /// First `<key>.backup.<timestamp>[.<n>]` path that does not exist yet.
    fn free_backup_path(&self, timestamp: &str) -> PathBuf {
        let mut base = self.key_path.clone().into_os_string();
        base.push(format!(".backup.{}", timestamp));
        let base = PathBuf::from(base);

        let mut candidate = base.clone();
        let mut counter = 1;
        while candidate.exists() {
            let mut name = base.clone().into_os_string();
            name.push(format!(".{}", counter));
            candidate = PathBuf::from(name);
            counter += 1;
        }
        candidate
    }

    fn error(&self, e: std::io::Error) -> SetupError {
        SetupError::KeyStore {
            path: self.key_path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(true)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<bool> {
    Ok(false)
}
