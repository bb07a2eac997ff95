use std::io;
use std::io::Write;

use app_setup_cli::{
    commands::setup_cmd::{handle_setup_command, SetupArgs, SetupCommandResult},
    errors::Error,
    output::{init_colors, print_error},
};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Creates a GitHub App for self-hosted runners via the manifest flow
#[derive(Parser)]
#[command(name = "setup-github-app")]
#[command(
    about = "Create a GitHub App for self-hosted runners and store its credentials",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    setup: SetupArgs,
}

/// Prompts on stdout and reads one line from stdin.
///
/// End of input counts as an interrupt, like Ctrl-C.
fn ask_user_for_value(request: &str) -> Result<String, Error> {
    print!("{}", request);

    io::stdout().flush().map_err(|_| Error::StdOutFlushFailed)?;

    let mut answer = String::new();
    let read = io::stdin()
        .read_line(&mut answer)
        .map_err(|e| Error::ReadInput(e.to_string()))?;
    if read == 0 {
        return Err(Error::Interrupted);
    }
    Ok(answer.trim().to_string())
}

/// Process exit code for a finished run: 0 on success or decline, 1 otherwise.
fn exit_code(result: &Result<SetupCommandResult, Error>) -> i32 {
    match result {
        Ok(SetupCommandResult::Completed(_)) | Ok(SetupCommandResult::Declined) => 0,
        Err(_) => 1,
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("APP_SETUP_LOG"))
        .init();
    init_colors();

    let cli = Cli::parse();

    let result = tokio::select! {
        result = handle_setup_command(cli.setup, ask_user_for_value) => result,
        _ = tokio::signal::ctrl_c() => Err(Error::Interrupted),
    };

    match &result {
        Ok(SetupCommandResult::Declined) => println!("Aborted."),
        Err(Error::Interrupted) => println!("\n\nAborted by user."),
        Err(e) => {
            error!("Error: {e}");
            print_error(&e.to_string());
        }
        Ok(SetupCommandResult::Completed(_)) => {}
    }

    std::process::exit(exit_code(&result));
}
