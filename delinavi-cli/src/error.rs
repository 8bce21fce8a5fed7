//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use delinavi::config::ConfigError;
use delinavi::logging::LoggingError;

/// Errors surfaced to the user. Any of them exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, edited or saved.
    Config(String),
    /// An input file is missing or malformed.
    Input { path: PathBuf, message: String },
    /// Writing output failed.
    Io(std::io::Error),
    /// Serializing output failed.
    Json(serde_json::Error),
    Logging(LoggingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input { path, message } => {
                write!(f, "Invalid input {}: {}", path.display(), message)
            }
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Json(e) => write!(f, "JSON error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Config(_) | CliError::Input { .. } => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl CliError {
    /// Exit the process with this error.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(1);
    }
}
