use serde::{Deserialize, Serialize};

/// Phases of one install/update run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Resolving,
    Aggregating,
    Updating,
    Done,
}

/// Orchestration events emitted by the installer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    PhaseChanged { phase: InstallPhase },

    /// The lock produced no imports
    NothingToInstall,

    /// Dev imports are installed as declared but never walked
    DevImportsNotResolved { count: usize },

    PoolStarted { dependencies: usize, workers: usize },

    PoolFinished {
        updated: usize,
        failed: usize,
        cancelled: usize,
        duration_ms: u64,
    },

    /// A vendor directory no longer referenced by any dependency was removed
    Pruned { path: String },
}
