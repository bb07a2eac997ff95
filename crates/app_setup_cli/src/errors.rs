use app_setup_core::SetupError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the setup CLI.
///
/// Every variant ends the run with a non-zero exit code.
#[derive(Error, Debug)]
pub enum Error {
    /// The setup flow itself failed.
    ///
    /// Covers invalid names, the callback timeout, a rejected code and
    /// failures while writing the key or the `.env` file.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// The tool's settings file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Reading an answer from the terminal failed.
    #[error("Failed to read input: {0}")]
    ReadInput(String),

    /// Failed to flush the standard output buffer.
    #[error("Failed to flush the std out buffer.")]
    StdOutFlushFailed,

    /// The operator pressed Ctrl-C or closed the input stream.
    #[error("Aborted by user.")]
    Interrupted,
}
