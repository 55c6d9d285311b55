//! CLI error handling

use std::fmt;

use vendr_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(vendr_errors::ConfigError),
    /// Error from the library crates
    Ops(vendr_errors::Error),
    /// Some repositories could not be fetched or updated
    Incomplete { command: &'static str, failed: usize },
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Incomplete { command, failed } => {
                write!(f, "{command} finished with {failed} failed repositories")
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Incomplete { .. } => None,
        }
    }
}

impl From<vendr_errors::ConfigError> for CliError {
    fn from(e: vendr_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<vendr_errors::Error> for CliError {
    fn from(e: vendr_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
