//! Failure records attached to failed tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a terminal task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The payload failed the capability's structural check.
    Validation,
    /// No registered agent declares the capability.
    NoCapableAgent,
    /// Every candidate agent failed at the transport level.
    AgentUnavailable,
    /// An agent refused the task.
    Rejected,
    /// The task was cancelled.
    Cancelled,
    /// The agent executing the task reported failure.
    AgentReported,
    /// The owning agent sent a report the task lifecycle refuses.
    ProtocolViolation,
    /// Child results did not arrive before the aggregation deadline.
    AggregationTimedOut,
}

impl FailureKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NoCapableAgent => "no_capable_agent",
            Self::AgentUnavailable => "agent_unavailable",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::AgentReported => "agent_reported",
            Self::ProtocolViolation => "protocol_violation",
            Self::AggregationTimedOut => "aggregation_timed_out",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a task failed.
///
/// Every failure carries a non-empty reason; a blank reason is replaced by
/// the failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    kind: FailureKind,
    reason: String,
}

impl TaskFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        let raw = reason.into();
        let trimmed = raw.trim();
        let recorded = if trimmed.is_empty() {
            kind.as_str().to_owned()
        } else {
            trimmed.to_owned()
        };
        Self {
            kind,
            reason: recorded,
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the recorded reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}
