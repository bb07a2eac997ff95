//! The setup command.
//!
//! Collects the organization and the optional instance name, asks for
//! confirmation, then runs the manifest flow and prints what was configured.
//!
//! Prompting is injected as a function so the command can be driven from tests.
//! Blocking reads run on tokio's blocking pool, which keeps Ctrl-C responsive
//! while the operator is typing.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use app_setup_core::{
    AppSetup, InstanceName, OrganizationName, SetupError, SetupOptions, SetupOutcome,
};
use clap::Args;
use colored::Colorize;
use github_client::ManifestConversionClient;
use tracing::{debug, info};

use crate::{
    config::{get_config_path, SetupConfig},
    errors::Error,
    output::{print_header, print_info, TerminalObserver},
};

#[cfg(test)]
#[path = "setup_cmd_tests.rs"]
mod setup_cmd_tests;

/// Command-line arguments for the setup command.
///
/// Values given here skip the matching prompt and override the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct SetupArgs {
    /// GitHub organization that will own the app.
    #[arg(long)]
    pub org: Option<String>,

    /// Label distinguishing several runner setups in one organization, e.g. `prod`.
    ///
    /// Pass an empty value for a single setup.
    #[arg(long)]
    pub instance: Option<String>,

    /// Directory that receives the private key and the `.env` file.
    ///
    /// Defaults to the current directory.
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Path to a TOML settings file.
    #[arg(long)]
    pub config: Option<String>,

    /// Port of the local callback server.
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds to wait for GitHub's callback.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Do not try to open a browser.
    #[arg(long)]
    pub no_browser: bool,
}

/// How a setup command ended without an error.
#[derive(Debug)]
pub enum SetupCommandResult {
    Completed(Box<SetupOutcome>),

    /// The operator answered the confirmation with something other than yes.
    Declined,
}

/// The validated answers to the prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInputs {
    pub organization: OrganizationName,
    pub instance: Option<InstanceName>,
}

/// Loads the settings file and applies the command-line overrides.
///
/// An explicitly named file must exist; the default file is optional.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be loaded, or
/// `Error::InvalidArguments` if the timeout is zero.
pub fn load_settings(args: &SetupArgs) -> Result<SetupConfig, Error> {
    let path = get_config_path(args.config.as_deref());
    let mut config = if args.config.is_some() {
        SetupConfig::load(&path)?
    } else {
        SetupConfig::load_or_default(&path)?
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.callback_timeout_secs = timeout_secs;
    }

    if config.callback_timeout_secs == 0 {
        return Err(Error::InvalidArguments(
            "--timeout-secs must be greater than 0".to_string(),
        ));
    }

    debug!(
        port = config.port,
        timeout_secs = config.callback_timeout_secs,
        "Settings loaded"
    );
    Ok(config)
}

/// Resolves the project directory to an absolute path.
///
/// # Errors
///
/// Returns `Error::InvalidArguments` if the directory does not exist.
pub fn resolve_project_dir(project_dir: Option<&Path>) -> Result<PathBuf, Error> {
    let dir = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| {
            Error::InvalidArguments(format!("Cannot determine the current directory: {}", e))
        })?,
    };

    let resolved = dir.canonicalize().map_err(|e| {
        Error::InvalidArguments(format!("Project directory {:?} is not accessible: {}", dir, e))
    })?;
    if !resolved.is_dir() {
        return Err(Error::InvalidArguments(format!(
            "Project directory {:?} is not a directory",
            dir
        )));
    }
    Ok(resolved)
}

/// Asks for the organization and the instance unless they were given as arguments.
///
/// # Errors
///
/// Returns `Error::Setup` wrapping a validation error for malformed names, or
/// whatever `ask_user_for_value` fails with.
pub fn collect_inputs<AskFn>(args: &SetupArgs, ask_user_for_value: AskFn) -> Result<SetupInputs, Error>
where
    AskFn: Fn(&str) -> Result<String, Error>,
{
    let organization = match &args.org {
        Some(org) => org.clone(),
        None => ask_user_for_value("Enter your GitHub organization name: ")?,
    };
    let organization = OrganizationName::new(organization).map_err(SetupError::from)?;

    let instance = match &args.instance {
        Some(instance) => instance.clone(),
        None => {
            println!();
            println!("{}", "Multiple runner instances?".cyan());
            println!("  If you have multiple self-hosted runner setups (e.g., dev, prod, gpu),");
            println!("  enter an identifier to distinguish this app. Leave empty for single instance.");
            println!();
            ask_user_for_value("Instance name (optional, e.g., 'prod', 'gpu'): ")?
        }
    };
    let instance = InstanceName::parse_optional(&instance).map_err(SetupError::from)?;

    Ok(SetupInputs {
        organization,
        instance,
    })
}

/// Asks whether to create the app. An empty answer or `y` means yes.
pub fn confirm<AskFn>(app_name: &str, ask_user_for_value: AskFn) -> Result<bool, Error>
where
    AskFn: Fn(&str) -> Result<String, Error>,
{
    println!("This will create a GitHub App named: {}", app_name.cyan());
    let answer = ask_user_for_value("Continue? (Y/n): ")?;
    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y")
}

/// Combines the settings and the answers into the options of one run.
pub fn build_options(config: &SetupConfig, inputs: &SetupInputs, project_dir: PathBuf) -> SetupOptions {
    let mut options = SetupOptions::new(
        inputs.organization.clone(),
        inputs.instance.clone(),
        project_dir,
    );
    options.bind_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    options.callback_timeout = Duration::from_secs(config.callback_timeout_secs);
    options.web_base_url = config.web_base_url.clone();
    options.homepage_url = config.homepage_url.clone();
    options.key_file_name = config.key_file_name.clone();
    options.env_file_name = config.env_file_name.clone();
    options.env_template_name = config.env_template_name.clone();
    options
}

/// Runs a blocking prompt without stalling the runtime.
async fn prompt<T, F>(ask: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(ask)
        .await
        .map_err(|e| Error::ReadInput(e.to_string()))?
}

fn print_intro() {
    println!("This tool will create a GitHub App with minimal permissions");
    println!("for self-hosted runner authentication.");
    println!();
    println!("{}", "Advantages over PAT:".cyan());
    println!("  - Minimal permissions (not full admin:org access)");
    println!("  - Automatic token rotation");
    println!("  - Better audit logs");
    println!();
}

fn print_plan(inputs: &SetupInputs, app_name: &str, port: u16) {
    print_header("GitHub App Setup");

    println!("Organization: {}", inputs.organization.as_str().cyan());
    if let Some(instance) = &inputs.instance {
        println!("Instance:     {}", instance.as_str().cyan());
    }
    println!("App Name:     {}", app_name.cyan());
    println!();

    print_info("Manifest created with permissions:");
    println!("  - Organization Self-hosted Runners: write");
    println!("  - Repository Administration: write");
    println!();
    print_info(&format!("Starting callback server on port {}...", port));
}

fn print_summary(organization: &OrganizationName, outcome: &SetupOutcome) {
    print_header("Setup Complete!");

    println!("{}", "GitHub App has been created and configured!".green());
    println!();
    println!("Configuration:");
    println!("  APP_ID={}", outcome.app_id);
    println!("  APP_LOGIN={}", organization);
    println!("  APP_PRIVATE_KEY_FILE={}", outcome.key.path.display());
    println!();
    println!(
        "{}",
        "Important: Install the app in your organization:".yellow()
    );
    println!("  {}", outcome.installations_url);
    println!();
    println!("Next steps:");
    println!("  1. {} (link above)", "Install the app".cyan());
    println!("  2. {} to start runners", "./runner.sh start".cyan());
    println!();
    println!("{}", "Optional: Add a logo to your app:".blue());
    println!("  {}", outcome.settings_url);
    println!("  (Scroll to 'Display information' section)");
    println!();
}

/// Handles the complete setup workflow.
///
/// # Arguments
///
/// * `args` - Parsed command-line arguments
/// * `ask_user_for_value` - Prompts the operator and returns the trimmed answer
///
/// # Errors
///
/// Returns an error if the settings, the answers or any step of the setup flow fail.
/// `Error::Interrupted` is passed through from `ask_user_for_value`.
pub async fn handle_setup_command<AskFn>(
    args: SetupArgs,
    ask_user_for_value: AskFn,
) -> Result<SetupCommandResult, Error>
where
    AskFn: Fn(&str) -> Result<String, Error> + Send + Sync + 'static,
{
    let config = load_settings(&args)?;
    let project_dir = resolve_project_dir(args.project_dir.as_deref())?;

    print_header("GitHub App Creator for Self-Hosted Runners");
    print_intro();

    let ask = Arc::new(ask_user_for_value);

    let inputs = {
        let args = args.clone();
        let ask = Arc::clone(&ask);
        prompt(move || collect_inputs(&args, |request: &str| (*ask)(request))).await?
    };

    print_info(&format!("Project directory: {}", project_dir.display()));
    println!();

    let client = ManifestConversionClient::new(&config.api_base_url, &config.user_agent)
        .map_err(|e| Error::Config(format!("Invalid api_base_url: {}", e)))?;
    let setup = AppSetup::new(build_options(&config, &inputs, project_dir), client);
    let app_name = setup.app_name();

    if !args.yes {
        let ask = Arc::clone(&ask);
        let name = app_name.clone();
        let confirmed = prompt(move || confirm(&name, |request: &str| (*ask)(request))).await?;
        if !confirmed {
            info!("Setup declined by the operator");
            return Ok(SetupCommandResult::Declined);
        }
    }

    print_plan(&inputs, &app_name, config.port);

    let observer = TerminalObserver::new(!args.no_browser);
    let outcome = setup.run(&observer).await?;

    print_summary(&inputs.organization, &outcome);
    Ok(SetupCommandResult::Completed(Box::new(outcome)))
}
