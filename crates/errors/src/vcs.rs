//! Version control error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VcsError {
    #[error("{program} {args} failed (exit {code:?}): {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("unsupported version control system for {package}: {kind}")]
    Unsupported { package: String, kind: String },

    #[error("{path} exists but is not a {kind} working copy")]
    NotAWorkingCopy { path: String, kind: String },

    #[error("{field} `{value}` for {package} would be read as a command-line option")]
    OptionLikeArgument {
        package: String,
        field: String,
        value: String,
    },
}

impl UserFacingError for VcsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::SpawnFailed { .. } => Some("Install the version control tool and ensure it is on PATH."),
            Self::NotAWorkingCopy { .. } => {
                Some("Re-run with --force to replace the directory with a fresh checkout.")
            }
            Self::Unsupported { .. } => {
                Some("Set `vcs` and `repo` for the dependency in vendr.yaml.")
            }
            Self::OptionLikeArgument { .. } => {
                Some("Remotes and references in vendr.yaml must not start with `-`.")
            }
            Self::CommandFailed { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::CommandFailed { .. } => "vcs.command_failed",
            Self::SpawnFailed { .. } => "vcs.spawn_failed",
            Self::Unsupported { .. } => "vcs.unsupported",
            Self::NotAWorkingCopy { .. } => "vcs.not_a_working_copy",
            Self::OptionLikeArgument { .. } => "vcs.option_like_argument",
        };
        Some(code)
    }
}
