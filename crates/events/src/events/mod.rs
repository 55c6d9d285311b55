use serde::{Deserialize, Serialize};

use crate::EventSource;
use vendr_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod fetch;
pub mod general;
pub mod install;
pub mod resolver;

pub use fetch::*;
pub use general::*;
pub use install::*;
pub use resolver::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Repository fetch/update events
    Fetch(FetchEvent),

    /// Import graph walk events
    Resolver(ResolverEvent),

    /// Install/update orchestration events
    Install(InstallEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Fetch(_) => EventSource::FETCH,
            Self::Resolver(_) => EventSource::RESOLVER,
            Self::Install(_) => EventSource::INSTALL,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Resolver(ResolverEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Fetch(FetchEvent::Failed { .. })
            | Self::Resolver(ResolverEvent::InvalidImport { .. })
            | Self::Install(InstallEvent::DevImportsNotResolved { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Fetch(FetchEvent::Skipped { .. } | FetchEvent::Completed { .. })
            | Self::Install(InstallEvent::PhaseChanged { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "vendr::events::general",
            Self::Fetch(_) => "vendr::events::fetch",
            Self::Resolver(_) => "vendr::events::resolver",
            Self::Install(_) => "vendr::events::install",
        }
    }
}
