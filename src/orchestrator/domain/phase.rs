//! Per-task dispatch phases tracked by the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator is in delegating one task.
///
/// The stored task status stays `pending` until an agent reports progress,
/// so a task being retried is `Retrying` here and `pending` in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    /// Stored and not yet sent to any agent.
    Created,
    /// Accepted by, or being sent to, an agent.
    Dispatched,
    /// The owning agent reported progress.
    Running,
    /// A failed attempt is followed by another within the retry budget.
    Retrying,
    /// The task completed.
    Completed,
    /// The last attempt failed, or the task was failed.
    Failed,
}

impl DispatchPhase {
    /// Returns the lowercase phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Dispatched => "dispatched",
            Self::Running => "running",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the phase may advance to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Dispatched | Self::Failed)
                | (
                    Self::Dispatched,
                    Self::Running | Self::Completed | Self::Failed
                )
                | (Self::Running, Self::Running | Self::Completed | Self::Failed)
                | (Self::Failed, Self::Retrying)
                | (Self::Retrying, Self::Dispatched | Self::Failed)
        )
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
