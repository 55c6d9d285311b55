//! Import graph resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolveError {
    #[error("invalid resolver base {path}: {message}")]
    InvalidBase { path: String, message: String },

    #[error("cannot resolve {package}: {message}")]
    Unresolvable { package: String, message: String },

    #[error("failed to read package {package}: {message}")]
    ReadFailed { package: String, message: String },
}

impl UserFacingError for ResolveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidBase { .. } => "resolve.invalid_base",
            Self::Unresolvable { .. } => "resolve.unresolvable",
            Self::ReadFailed { .. } => "resolve.read_failed",
        };
        Some(code)
    }
}
