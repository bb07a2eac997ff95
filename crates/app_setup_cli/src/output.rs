//! Colored terminal output.
//!
//! The `format_*` functions build the text, the `print_*` functions write it to
//! stdout. Colors are switched off when stdout is not a terminal.

use std::io::IsTerminal;

use app_setup_core::{SavedKey, SetupObserver};
use colored::Colorize;
use config_manager::{EnvFileOrigin, EnvUpdateReport};
use github_client::AppCredentials;
use url::Url;

use crate::browser;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

const HEADER_WIDTH: usize = 60;
const BANNER_WIDTH: usize = 70;

/// Disables colors when stdout is redirected.
pub fn init_colors() {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}

pub fn format_header(title: &str) -> String {
    let rule = "=".repeat(HEADER_WIDTH);
    format!("\n{}\n", format!("{}\n  {}\n{}", rule, title, rule).blue())
}

pub fn format_success(message: &str) -> String {
    format!("✓ {}", message).green().to_string()
}

pub fn format_error(message: &str) -> String {
    format!("✗ {}", message).red().to_string()
}

pub fn format_info(message: &str) -> String {
    format!("ℹ {}", message).cyan().to_string()
}

pub fn format_warning(message: &str) -> String {
    format!("⚠ {}", message).yellow().to_string()
}

pub fn print_header(title: &str) {
    println!("{}", format_header(title));
}

pub fn print_success(message: &str) {
    println!("{}", format_success(message));
}

pub fn print_error(message: &str) {
    println!("{}", format_error(message));
}

pub fn print_info(message: &str) {
    println!("{}", format_info(message));
}

pub fn print_warning(message: &str) {
    println!("{}", format_warning(message));
}

/// The block telling the operator which URL to open, plus the SSH hint for remote hosts.
pub fn format_start_instructions(start_url: &Url) -> String {
    let banner = "=".repeat(BANNER_WIDTH).green();
    let port = start_url.port_or_known_default().unwrap_or_default();

    let mut output = String::new();
    output.push_str(&format!("\n{}\n", banner));
    output.push_str(&format!("{}\n", "  Open this URL in your browser:".green()));
    output.push_str(&format!("{}\n\n", banner));
    output.push_str(&format!("{}\n\n", start_url));
    output.push_str(&format!("{}\n\n", banner));
    output.push_str("This page will automatically redirect to GitHub with the\n");
    output.push_str("app manifest pre-filled (name, permissions, etc.).\n\n");
    output.push_str(&format!(
        "{}\n",
        "SSH Port Forwarding (if on remote server):".cyan()
    ));
    output.push_str(&format!(
        "  ssh -L {}:localhost:{} user@server\n",
        port, port
    ));
    output
}

fn describe_origin(origin: EnvFileOrigin) -> Option<&'static str> {
    match origin {
        EnvFileOrigin::Existing => None,
        EnvFileOrigin::CopiedFromTemplate => Some("Created .env from the template"),
        EnvFileOrigin::CreatedWithDefaults => Some("Created a new .env file"),
    }
}

/// Reports setup progress on the terminal.
pub struct TerminalObserver {
    open_browser: bool,
}

impl TerminalObserver {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl SetupObserver for TerminalObserver {
    fn server_started(&self, start_url: &Url) {
        print!("{}", format_start_instructions(start_url));
        println!();

        if self.open_browser {
            match browser::open(start_url.as_str()) {
                Ok(()) => print_success("Browser opened"),
                Err(e) => tracing::debug!(error = %e, "Could not open a browser"),
            }
        }

        let port = start_url.port_or_known_default().unwrap_or_default();
        println!(
            "{}\n",
            format!("Waiting for GitHub callback on port {}...", port).yellow()
        );
    }

    fn code_received(&self) {
        print_success("Received callback from GitHub!");
        println!();
    }

    fn exchanging_code(&self) {
        print_info("Exchanging code for app credentials...");
    }

    fn credentials_received(&self, credentials: &AppCredentials, slug: &str) {
        print_success("App created successfully!");
        println!("  App ID:   {}", credentials.id.to_string().cyan());
        println!("  App Slug: {}", slug.cyan());
        println!();
        print_info("Saving private key...");
    }

    fn key_saved(&self, key: &SavedKey) {
        if let Some(backup) = &key.backup {
            print_info(&format!("Existing key backed up to: {}", backup.display()));
        }
        let name = key
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.path.display().to_string());
        print_success(&format!("Private key saved to: {}", name));
        if !key.permissions_restricted && cfg!(unix) {
            print_warning("Could not restrict the private key to owner-only access");
        }
        println!();
        print_info("Updating .env configuration...");
    }

    fn config_updated(&self, report: &EnvUpdateReport) {
        if let Some(origin) = describe_origin(report.origin) {
            print_info(origin);
        }
        if report.legacy_tokens_disabled > 0 {
            print_warning("GITHUB_ACCESS_TOKEN was commented out, the app replaces it");
        }
        print_success(".env file updated!");
        println!();
    }
}
