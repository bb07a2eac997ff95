//! Flat `KEY=value` configuration file management.
//!
//! This crate patches `.env` style files in place: existing assignments are updated,
//! commented-out assignments are re-activated and missing ones are appended, while
//! every unrelated line is preserved exactly. It is not a general configuration
//! language; one assignment per line with an optional leading comment marker is
//! the entire format.

pub mod env_file;
pub mod env_updater;
pub mod errors;

// Re-export for convenient access
pub use env_file::{EnvFile, EnvLine, LineEnding, UpsertOutcome};
pub use env_updater::{AppEnvSettings, EnvFileOrigin, EnvFileUpdater, EnvUpdateReport};
pub use errors::{ConfigurationError, ConfigurationResult};
