use std::time::Duration;
use vendr_errors::Error;
use vendr_types::Manifest;

/// What happened to one dependency in a pool run
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated,
    Failed(Error),
    TimedOut,
    /// Not attempted because the run was cancelled
    Cancelled,
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Outcome for a named dependency
#[derive(Debug, Clone)]
pub struct UpdateEntry {
    pub dependency: String,
    pub outcome: UpdateOutcome,
}

/// Per-dependency results of one pool run, in input order
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    entries: Vec<UpdateEntry>,
    /// Wall time of the run
    pub duration: Duration,
}

impl UpdateReport {
    /// Create a report from entries already in input order
    #[must_use]
    pub fn new(entries: Vec<UpdateEntry>, duration: Duration) -> Self {
        Self { entries, duration }
    }

    #[must_use]
    pub fn entries(&self) -> &[UpdateEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome recorded for `dependency`
    #[must_use]
    pub fn outcome(&self, dependency: &str) -> Option<&UpdateOutcome> {
        self.entries
            .iter()
            .find(|e| e.dependency == dependency)
            .map(|e| &e.outcome)
    }

    #[must_use]
    pub fn updated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_updated()).count()
    }

    /// Entries that failed or timed out
    pub fn failures(&self) -> impl Iterator<Item = &UpdateEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, UpdateOutcome::Failed(_) | UpdateOutcome::TimedOut))
    }

    #[must_use]
    pub fn cancelled_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, UpdateOutcome::Cancelled))
            .count()
    }

    /// Whether every dependency was updated
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_updated())
    }
}

/// Result of installing from a lock file
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// The lock projected back into a manifest
    pub manifest: Manifest,
    pub imports: UpdateReport,
    pub dev_imports: UpdateReport,
}
