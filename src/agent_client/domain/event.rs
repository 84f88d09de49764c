//! Events yielded by status subscriptions.

use crate::agent_registry::domain::AgentId;
use crate::task::domain::{TaskId, TaskStatusReport};

/// One observation of a delegated task.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// The agent reported a status that differs from the previous one.
    Observed {
        /// Observed task.
        task_id: TaskId,
        /// Agent that reported it.
        agent_id: AgentId,
        /// Reported status document.
        report: TaskStatusReport,
    },
    /// The agent can no longer be followed.
    AgentLost {
        /// Task the agent was executing.
        task_id: TaskId,
        /// Lost agent.
        agent_id: AgentId,
        /// Why the subscription ended.
        reason: String,
    },
}

impl StatusEvent {
    /// Returns the task the event concerns.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::Observed { task_id, .. } | Self::AgentLost { task_id, .. } => task_id,
        }
    }

    /// Returns whether no further events follow this one.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        match self {
            Self::Observed { report, .. } => report.status.is_terminal(),
            Self::AgentLost { .. } => true,
        }
    }
}
