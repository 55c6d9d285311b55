use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Import graph walk events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Walk started from the declared roots
    Started { roots: usize },

    /// An import had no working copy and is being fetched on demand
    PackageMissing { package: String, destination: String },

    /// An import was satisfied from the secondary source path
    OnSourcePath { package: String },

    /// An import path could not be normalized and was skipped
    InvalidImport { package: String, reason: String },

    Completed { packages: usize, duration_ms: u64 },

    Failed { failure: FailureContext },
}
