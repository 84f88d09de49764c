//! Request and acknowledgement bodies of the task-creation endpoint.

use crate::agent_registry::domain::CapabilityId;
use crate::task::domain::{Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body posted to an agent's `task_create` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreateRequest {
    /// Identifier the agent must report status under.
    pub task_id: TaskId,
    /// Parent task, for sub-tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<TaskId>,
    /// Capability the agent is asked to exercise.
    pub agent_capability: CapabilityId,
    /// Opaque task payload.
    pub payload: Value,
}

impl TaskCreateRequest {
    /// Builds the request for a stored task.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id().clone(),
            parent_task_id: task.parent_id().cloned(),
            agent_capability: task.capability().clone(),
            payload: task.payload().clone(),
        }
    }
}

/// Agent acknowledgement of a task-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAck {
    /// Whether the agent took the task.
    pub accepted: bool,
    /// Refusal reason when not accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DispatchAck {
    /// An acknowledgement accepting the task.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// An acknowledgement refusing the task.
    #[must_use]
    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}
