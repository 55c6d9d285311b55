//! Manifest and lock file error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ManifestError {
    #[error("manifest not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("failed to serialize manifest: {message}")]
    SerializeError { message: String },

    #[error("no project root (vendr.yaml) found above {start}")]
    ProjectRootNotFound { start: String },

    #[error("invalid content hash {value}: {message}")]
    InvalidHash { value: String, message: String },
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } | Self::ProjectRootNotFound { .. } => {
                Some("Create a vendr.yaml at the project root.")
            }
            Self::ParseError { .. } => Some("Fix the YAML syntax and retry."),
            Self::InvalidHash { .. } => Some("The lock file looks corrupted; run `vendr update`."),
            Self::SerializeError { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "manifest.not_found",
            Self::ParseError { .. } => "manifest.parse",
            Self::SerializeError { .. } => "manifest.serialize",
            Self::ProjectRootNotFound { .. } => "manifest.project_root_not_found",
            Self::InvalidHash { .. } => "manifest.invalid_hash",
        };
        Some(code)
    }
}
