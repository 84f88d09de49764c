//! Task aggregate root and status updates.

use super::{Progress, TaskDomainError, TaskFailure, TaskId, TaskStatus};
use crate::agent_registry::domain::CapabilityId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter object describing a task to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    id: TaskId,
    parent_id: Option<TaskId>,
    capability: CapabilityId,
    payload: Value,
}

impl NewTask {
    /// Creates a root task description.
    #[must_use]
    pub const fn new(id: TaskId, capability: CapabilityId, payload: Value) -> Self {
        Self {
            id,
            parent_id: None,
            capability,
            payload,
        }
    }

    /// Sets the parent task.
    #[must_use]
    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Returns the identifier the task will be stored under.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<&TaskId> {
        self.parent_id.as_ref()
    }

    /// Returns the capability the task is addressed to.
    #[must_use]
    pub const fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Returns the task payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Status change reported for a task.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The task is running with the given progress.
    Running {
        /// Reported progress.
        progress: Progress,
    },
    /// The task completed with a result.
    Completed {
        /// Result document.
        result: Value,
    },
    /// The task failed.
    Failed {
        /// Failure record.
        failure: TaskFailure,
    },
}

impl StatusUpdate {
    /// Returns the status the update moves the task to.
    #[must_use]
    pub const fn target_status(&self) -> TaskStatus {
        match self {
            Self::Running { .. } => TaskStatus::Running,
            Self::Completed { .. } => TaskStatus::Completed,
            Self::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// Task aggregate root.
///
/// `result` is present only when completed and `failure` only when failed.
/// The revision increments with every accepted update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    parent_id: Option<TaskId>,
    capability: CapabilityId,
    payload: Value,
    status: TaskStatus,
    progress: Progress,
    result: Option<Value>,
    failure: Option<TaskFailure>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task at revision zero.
    #[must_use]
    pub fn new(new_task: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let NewTask {
            id,
            parent_id,
            capability,
            payload,
        } = new_task;

        Self {
            id,
            parent_id,
            capability,
            payload,
            status: TaskStatus::Pending,
            progress: Progress::ZERO,
            result: None,
            failure: None,
            revision: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<&TaskId> {
        self.parent_id.as_ref()
    }

    /// Returns the target capability.
    #[must_use]
    pub const fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Returns the opaque payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the recorded progress.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the result when completed.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the failure record when failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    /// Returns the revision counter.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task is completed or failed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status update and bumps the revision.
    ///
    /// Completing a task sets its progress to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TerminalTaskMutation`] when the task is
    /// already terminal, [`TaskDomainError::InvalidStatusTransition`] when the
    /// transition table forbids the change, or
    /// [`TaskDomainError::ProgressRegression`] when a running task reports
    /// lower progress.
    pub fn apply(
        &mut self,
        update: StatusUpdate,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::TerminalTaskMutation {
                task_id: self.id.clone(),
                status: self.status,
            });
        }

        let target = update.target_status();
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: target,
            });
        }

        match update {
            StatusUpdate::Running { progress } => {
                if self.status == TaskStatus::Running && progress < self.progress {
                    return Err(TaskDomainError::ProgressRegression {
                        task_id: self.id.clone(),
                        current: self.progress,
                        requested: progress,
                    });
                }
                self.progress = progress;
            }
            StatusUpdate::Completed { result } => {
                self.progress = Progress::COMPLETE;
                self.result = Some(result);
            }
            StatusUpdate::Failed { failure } => {
                self.failure = Some(failure);
            }
        }

        self.status = target;
        self.revision = self.revision.saturating_add(1);
        self.updated_at = clock.utc();
        Ok(())
    }
}
