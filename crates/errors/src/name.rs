//! Import path normalization errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NormalizationError {
    #[error("empty import path")]
    Empty,

    #[error("import path {path} has no host segment")]
    NoHost { path: String },

    #[error("import path {path} contains an empty segment")]
    EmptySegment { path: String },

    #[error("import path {path} contains a `.` or `..` segment")]
    DotSegment { path: String },
}

impl UserFacingError for NormalizationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Empty => "name.empty",
            Self::NoHost { .. } => "name.no_host",
            Self::EmptySegment { .. } => "name.empty_segment",
            Self::DotSegment { .. } => "name.dot_segment",
        };
        Some(code)
    }
}
