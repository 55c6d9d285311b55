//! Installation system error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstallError {
    #[error("vendor directory not found: {message}")]
    VendorNotFound { message: String },

    #[error("failed to fetch {package} into {target}: {message}")]
    FetchFailed {
        package: String,
        target: String,
        message: String,
    },

    #[error("update failed for {package}: {message}")]
    UpdateFailed { package: String, message: String },

    #[error("operation on {package} timed out after {timeout_seconds}s")]
    OperationTimeout {
        package: String,
        timeout_seconds: u64,
    },

    #[error("installation cancelled")]
    Cancelled,

    #[error("concurrency error: {message}")]
    ConcurrencyError { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("invalid install configuration: {message}")]
    InvalidConfig { message: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::VendorNotFound { .. } => {
                Some("Run the command from a project containing a vendr.yaml file.")
            }
            Self::FetchFailed { .. } | Self::UpdateFailed { .. } => {
                Some("Check network access and that the repository location is correct.")
            }
            Self::OperationTimeout { .. } => {
                Some("Increase `install.operation_timeout` in the configuration.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::UpdateFailed { .. } | Self::OperationTimeout { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::VendorNotFound { .. } => "install.vendor_not_found",
            Self::FetchFailed { .. } => "install.fetch_failed",
            Self::UpdateFailed { .. } => "install.update_failed",
            Self::OperationTimeout { .. } => "install.operation_timeout",
            Self::Cancelled => "install.cancelled",
            Self::ConcurrencyError { .. } => "install.concurrency",
            Self::FilesystemError { .. } => "install.filesystem",
            Self::InvalidConfig { .. } => "install.invalid_config",
        };
        Some(code)
    }
}
