//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::Style;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vendr_errors::UserFacingError;
use vendr_install::{UpdateOutcome, UpdateReport};

/// A repository that could not be fetched or updated
#[derive(Debug, Clone, Serialize)]
pub struct FailedRepository {
    pub package: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Summary of one command, rendered as a table or JSON
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandReport {
    pub command: &'static str,
    pub updated: Vec<String>,
    pub failed: Vec<FailedRepository>,
    pub cancelled: usize,
    /// Repositories cloned by `checkout`
    pub fetched: usize,
    pub pruned: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_file: Option<String>,
    pub duration_ms: u64,
}

impl CommandReport {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Fold a pool run into this report
    pub fn add_pool_run(&mut self, report: &UpdateReport) {
        for entry in report.entries() {
            match &entry.outcome {
                UpdateOutcome::Updated => self.updated.push(entry.dependency.clone()),
                UpdateOutcome::Failed(e) => self.failed.push(FailedRepository {
                    package: entry.dependency.clone(),
                    reason: e.user_message().into_owned(),
                    hint: e.user_hint().map(str::to_string),
                }),
                UpdateOutcome::TimedOut => self.failed.push(FailedRepository {
                    package: entry.dependency.clone(),
                    reason: "operation timed out".to_string(),
                    hint: Some("Increase the timeout with --timeout.".to_string()),
                }),
                UpdateOutcome::Cancelled => self.cancelled += 1,
            }
        }
        self.duration_ms = self
            .duration_ms
            .saturating_add(u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX));
    }

    pub fn with_lock_file(mut self, path: &Path) -> Self {
        self.lock_file = Some(path.display().to_string());
        self
    }

    pub fn with_pruned(mut self, pruned: &[PathBuf]) -> Self {
        self.pruned = pruned.iter().map(|p| p.display().to_string()).collect();
        self
    }

    /// Failures and cancellations that make the command unsuccessful
    pub fn unsuccessful(&self) -> usize {
        self.failed.len() + self.cancelled
    }
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    colors_enabled: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, colors_enabled: bool) -> Self {
        Self {
            json_output,
            colors_enabled,
        }
    }

    /// Render a command report
    pub fn render_report(&self, report: &CommandReport) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        let ok = self.style(Style::new().green());
        let bad = self.style(Style::new().red().bold());

        match report.command {
            "checkout" => {
                if report.fetched == 0 {
                    println!("All dependencies already vendored.");
                } else {
                    println!("{} {} repositories", ok.apply_to("Fetched"), report.fetched);
                }
            }
            _ => {
                if report.updated.is_empty() && report.failed.is_empty() && report.cancelled == 0 {
                    println!("No dependencies to update.");
                } else {
                    println!(
                        "{} {} repositories in {:.1}s",
                        ok.apply_to("Updated"),
                        report.updated.len(),
                        Duration::from_millis(report.duration_ms).as_secs_f64()
                    );
                }
            }
        }

        if !report.pruned.is_empty() {
            println!("Removed {} unused directories:", report.pruned.len());
            for path in &report.pruned {
                println!("  • {path}");
            }
        }

        if report.cancelled > 0 {
            println!("{} {} repositories were not processed", bad.apply_to("Cancelled:"), report.cancelled);
        }

        if !report.failed.is_empty() {
            println!();
            println!("{} ({}):", bad.apply_to("Failed"), report.failed.len());
            println!("{}", self.failure_table(&report.failed));
        }

        if let Some(lock) = &report.lock_file {
            println!("Wrote {lock}");
        }

        Ok(())
    }

    fn failure_table(&self, failed: &[FailedRepository]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Repository").add_attribute(Attribute::Bold),
                Cell::new("Reason").add_attribute(Attribute::Bold),
            ]);
        if !self.colors_enabled {
            table.force_no_tty();
        }

        for failure in failed {
            let reason = match &failure.hint {
                Some(hint) => format!("{}\n{hint}", failure.reason),
                None => failure.reason.clone(),
            };
            table.add_row(vec![
                Cell::new(&failure.package).fg(Color::Red),
                Cell::new(reason),
            ]);
        }
        table
    }

    fn style(&self, style: Style) -> Style {
        if self.colors_enabled {
            style.force_styling(true)
        } else {
            Style::new()
        }
    }
}
