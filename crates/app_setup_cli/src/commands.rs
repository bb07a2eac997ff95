//! Command modules for the setup CLI.
//!
//! - `setup_cmd`: creates the GitHub App and writes its credentials into the project

pub mod setup_cmd;
