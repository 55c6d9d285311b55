use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Which VCS primitive a fetch event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOperation {
    /// First-time clone into an empty target
    Fetch,
    /// Bring an existing working copy to its reference
    Update,
}

/// Per-repository fetch and update events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FetchEvent {
    Started {
        package: String,
        target: String,
        operation: FetchOperation,
    },

    Completed {
        package: String,
        operation: FetchOperation,
        duration_ms: u64,
    },

    /// Non-fatal failure; the surrounding batch continues
    Failed {
        package: String,
        operation: FetchOperation,
        failure: FailureContext,
    },

    /// Target already present or not applicable to this platform
    Skipped { package: String, reason: String },

    /// Copied from the secondary source path instead of the network
    CopiedFromSourcePath { package: String, source: String },
}
