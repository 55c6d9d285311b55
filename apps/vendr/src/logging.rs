//! Structured logging integration for events
//!
//! Every [`AppEvent`] is forwarded to `tracing` at the level the event itself
//! reports, with its payload as structured fields.

use vendr_events::{AppEvent, EventLevel, FetchEvent, GeneralEvent, InstallEvent, ResolverEvent};

/// Emit at a level only known at runtime; `tracing` needs literal levels
macro_rules! log_at {
    ($level:expr, target: $target:literal, $($rest:tt)+) => {
        match $level {
            EventLevel::Error => tracing::error!(target: $target, $($rest)+),
            EventLevel::Warn => tracing::warn!(target: $target, $($rest)+),
            EventLevel::Info => tracing::info!(target: $target, $($rest)+),
            EventLevel::Debug => tracing::debug!(target: $target, $($rest)+),
            EventLevel::Trace => tracing::trace!(target: $target, $($rest)+),
        }
    };
}

/// Log an `AppEvent` with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let level = EventLevel::from(event.log_level());
    let source = event.event_source();

    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                log_at!(level, target: "vendr::events::general", source = source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                log_at!(level, target: "vendr::events::general", source = source.as_str(), details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                log_at!(level, target: "vendr::events::general", source = source.as_str(), context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                log_at!(level, target: "vendr::events::general", operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                log_at!(level, target: "vendr::events::general", operation = %operation, success = success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                log_at!(level, target: "vendr::events::general", operation = %operation, error = %error, "Operation failed");
            }
        },

        AppEvent::Fetch(fetch) => match fetch {
            FetchEvent::Started {
                package,
                target,
                operation,
            } => {
                log_at!(level, target: "vendr::events::fetch", package = %package, destination = %target, operation = ?operation, "Repository operation started");
            }
            FetchEvent::Completed {
                package,
                operation,
                duration_ms,
            } => {
                log_at!(level, target: "vendr::events::fetch", package = %package, operation = ?operation, duration_ms = duration_ms, "Repository operation completed");
            }
            FetchEvent::Failed {
                package,
                operation,
                failure,
            } => {
                log_at!(
                    level,
                    target: "vendr::events::fetch",
                    package = %package,
                    operation = ?operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Repository operation failed"
                );
            }
            FetchEvent::Skipped { package, reason } => {
                log_at!(level, target: "vendr::events::fetch", package = %package, reason = %reason, "Repository skipped");
            }
            FetchEvent::CopiedFromSourcePath { package, source } => {
                log_at!(level, target: "vendr::events::fetch", package = %package, from = %source, "Copied from source path");
            }
        },

        AppEvent::Resolver(resolver) => match resolver {
            ResolverEvent::Started { roots } => {
                log_at!(level, target: "vendr::events::resolver", roots = roots, "Import resolution started");
            }
            ResolverEvent::PackageMissing {
                package,
                destination,
            } => {
                log_at!(level, target: "vendr::events::resolver", package = %package, destination = %destination, "Package missing, fetching");
            }
            ResolverEvent::OnSourcePath { package } => {
                log_at!(level, target: "vendr::events::resolver", package = %package, "Package found on source path");
            }
            ResolverEvent::InvalidImport { package, reason } => {
                log_at!(level, target: "vendr::events::resolver", package = %package, reason = %reason, "Import skipped");
            }
            ResolverEvent::Completed {
                packages,
                duration_ms,
            } => {
                log_at!(level, target: "vendr::events::resolver", packages = packages, duration_ms = duration_ms, "Import resolution completed");
            }
            ResolverEvent::Failed { failure } => {
                log_at!(
                    level,
                    target: "vendr::events::resolver",
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Import resolution failed"
                );
            }
        },

        AppEvent::Install(install) => match install {
            InstallEvent::PhaseChanged { phase } => {
                log_at!(level, target: "vendr::events::install", phase = ?phase, "Phase changed");
            }
            InstallEvent::NothingToInstall => {
                log_at!(level, target: "vendr::events::install", "Nothing to install");
            }
            InstallEvent::DevImportsNotResolved { count } => {
                log_at!(level, target: "vendr::events::install", count = count, "Development imports are fetched but not resolved");
            }
            InstallEvent::PoolStarted {
                dependencies,
                workers,
            } => {
                log_at!(level, target: "vendr::events::install", dependencies = dependencies, workers = workers, "Worker pool started");
            }
            InstallEvent::PoolFinished {
                updated,
                failed,
                cancelled,
                duration_ms,
            } => {
                log_at!(
                    level,
                    target: "vendr::events::install",
                    updated = updated,
                    failed = failed,
                    cancelled = cancelled,
                    duration_ms = duration_ms,
                    "Worker pool finished"
                );
            }
            InstallEvent::Pruned { path } => {
                log_at!(level, target: "vendr::events::install", path = %path, "Removed unused vendor directory");
            }
        },
    }
}
