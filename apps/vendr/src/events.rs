//! Event handling and terminal status lines

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use vendr_events::{AppEvent, FetchEvent, GeneralEvent, InstallEvent, InstallPhase, ResolverEvent};

/// Forwards events to `tracing` and prints short status lines to stderr
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Status lines are suppressed entirely in JSON mode
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: &AppEvent) {
        log_event_with_tracing(event);
        if self.quiet {
            return;
        }
        if let Some(line) = self.status_line(event) {
            // Ignore terminal write failures
            let _ = self.term.write_line(&line);
        }
    }

    fn status_line(&self, event: &AppEvent) -> Option<String> {
        let warn = self.style(Style::new().yellow());
        let err = self.style(Style::new().red().bold());
        let dim = self.style(Style::new().dim());

        match event {
            AppEvent::Install(InstallEvent::PhaseChanged { phase }) => {
                let text = match phase {
                    InstallPhase::Resolving => "Resolving imports",
                    InstallPhase::Aggregating => "Collecting repositories",
                    InstallPhase::Updating => "Updating repositories",
                    InstallPhase::Done => return None,
                };
                Some(format!("--> {text}"))
            }
            AppEvent::Install(InstallEvent::NothingToInstall) => {
                Some("--> No dependencies found. Nothing installed.".to_string())
            }
            AppEvent::Install(InstallEvent::DevImportsNotResolved { count }) => Some(format!(
                "{} {count} development imports are fetched but their imports are not resolved",
                warn.apply_to("[WARN]")
            )),
            AppEvent::Install(InstallEvent::Pruned { path }) => {
                Some(format!("--> Removed unused {path}"))
            }
            AppEvent::Resolver(ResolverEvent::PackageMissing { package, .. }) => {
                Some(format!("--> Fetching missing {package}"))
            }
            AppEvent::Resolver(ResolverEvent::InvalidImport { package, reason }) => Some(format!(
                "{} skipping {package}: {reason}",
                warn.apply_to("[WARN]")
            )),
            AppEvent::Fetch(FetchEvent::CopiedFromSourcePath { package, source }) => {
                Some(format!("--> Copied {package} from {source}"))
            }
            AppEvent::Fetch(FetchEvent::Failed {
                package, failure, ..
            }) => Some(format!(
                "{} {package}: {}",
                err.apply_to("[ERROR]"),
                failure.message
            )),
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                Some(match context {
                    Some(ctx) => format!("{} {message} ({ctx})", warn.apply_to("[WARN]")),
                    None => format!("{} {message}", warn.apply_to("[WARN]")),
                })
            }
            AppEvent::General(GeneralEvent::Error { message, .. }) => {
                Some(format!("{} {message}", err.apply_to("[ERROR]")))
            }
            AppEvent::Fetch(FetchEvent::Started {
                package, operation, ..
            }) if self.debug_enabled => Some(format!(
                "{}",
                dim.apply_to(format!("    {operation:?} {package}"))
            )),
            AppEvent::General(GeneralEvent::DebugLog { message, .. }) if self.debug_enabled => {
                Some(format!("{}", dim.apply_to(message)))
            }
            _ => None,
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.colors_enabled {
            style.force_styling(true)
        } else {
            Style::new()
        }
    }
}
