//! GitHub App setup CLI library exports for integration testing.
//!
//! This module exposes the command implementation and terminal helpers.

pub mod browser;
pub mod commands;
pub mod config;
pub mod errors;
pub mod output;
