//! Status documents exchanged with agents and callers.

use super::{FailureKind, Progress, StatusUpdate, Task, TaskFailure, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status document for one task.
///
/// Agents return this shape from their status endpoint, and the task store
/// produces it for callers with `sub_tasks` filled in for parents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Reported progress; zero when omitted.
    #[serde(default)]
    pub progress: Progress,
    /// Result document when completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure reason when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure category when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Child task summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<SubTaskSummary>>,
}

impl TaskStatusReport {
    /// A pending report with no progress.
    #[must_use]
    pub const fn pending() -> Self {
        Self::bare(TaskStatus::Pending, Progress::ZERO)
    }

    /// A running report at `progress`.
    #[must_use]
    pub const fn running(progress: Progress) -> Self {
        Self::bare(TaskStatus::Running, progress)
    }

    /// A completed report carrying `result`.
    #[must_use]
    pub fn completed(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::bare(TaskStatus::Completed, Progress::COMPLETE)
        }
    }

    /// A failed report carrying `reason`.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::bare(TaskStatus::Failed, Progress::ZERO)
        }
    }

    const fn bare(status: TaskStatus, progress: Progress) -> Self {
        Self {
            status,
            progress,
            result: None,
            error: None,
            failure_kind: None,
            sub_tasks: None,
        }
    }

    /// Builds the report for a stored task without child summaries.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            status: task.status(),
            progress: task.progress(),
            result: task.result().cloned(),
            error: task.failure().map(|failure| failure.reason().to_owned()),
            failure_kind: task.failure().map(TaskFailure::kind),
            sub_tasks: None,
        }
    }

    /// Attaches child summaries.
    #[must_use]
    pub fn with_sub_tasks(mut self, sub_tasks: Vec<SubTaskSummary>) -> Self {
        self.sub_tasks = Some(sub_tasks);
        self
    }

    /// Converts an agent report into the update it implies.
    ///
    /// Returns `None` for `pending`, which carries no new information. A
    /// failed report without a kind is recorded as agent-reported.
    #[must_use]
    pub fn to_update(&self) -> Option<StatusUpdate> {
        match self.status {
            TaskStatus::Pending => None,
            TaskStatus::Running => Some(StatusUpdate::Running {
                progress: self.progress,
            }),
            TaskStatus::Completed => Some(StatusUpdate::Completed {
                result: self.result.clone().unwrap_or(Value::Null),
            }),
            TaskStatus::Failed => Some(StatusUpdate::Failed {
                failure: TaskFailure::new(
                    self.failure_kind.unwrap_or(FailureKind::AgentReported),
                    self.error.clone().unwrap_or_default(),
                ),
            }),
        }
    }
}

/// Summary of one child task inside a parent's status document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskSummary {
    /// Child task identifier.
    pub task_id: TaskId,
    /// Child status.
    pub status: TaskStatus,
    /// Result count once completed, progress otherwise.
    #[serde(flatten)]
    pub detail: SubTaskDetail,
}

/// Status-dependent detail of a child summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubTaskDetail {
    /// Number of items in the child's result.
    ResultCount {
        /// Item count.
        result_count: usize,
    },
    /// Progress of an unfinished child.
    Progress {
        /// Reported progress.
        progress: Progress,
    },
}

impl SubTaskSummary {
    /// Summarises a child task.
    ///
    /// Completed children report how many items their result holds: the
    /// length of an array result, of a `results` array inside an object
    /// result, or one for any other non-null value.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        let detail = match (task.status(), task.result()) {
            (TaskStatus::Completed, result) => SubTaskDetail::ResultCount {
                result_count: result.map_or(0, result_count),
            },
            _ => SubTaskDetail::Progress {
                progress: task.progress(),
            },
        };
        Self {
            task_id: task.id().clone(),
            status: task.status(),
            detail,
        }
    }
}

fn result_count(result: &Value) -> usize {
    match result {
        Value::Null => 0,
        Value::Array(items) => items.len(),
        Value::Object(fields) => fields
            .get("results")
            .and_then(Value::as_array)
            .map_or(1, Vec::len),
        _ => 1,
    }
}
