//! Error types for task domain validation and transitions.

use super::{Progress, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating task values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskDomainError {
    /// The task identifier is empty after trimming.
    #[error("task id must not be empty")]
    EmptyTaskId,

    /// The task identifier contains whitespace or control characters.
    #[error("task id '{0}' must not contain whitespace or control characters")]
    InvalidTaskId(String),

    /// The task identifier exceeds the storage limit.
    #[error("task id exceeds {limit} character limit: {value}")]
    TaskIdTooLong {
        /// The rejected value.
        value: String,
        /// Maximum permitted length.
        limit: usize,
    },

    /// A progress value is outside `0.0..=1.0` or not finite.
    #[error("progress {0} must be a finite value between 0.0 and 1.0")]
    InvalidProgress(f64),

    /// The task is already completed or failed.
    #[error("task {task_id} is terminal ({status}) and cannot change")]
    TerminalTaskMutation {
        /// Task that rejected the update.
        task_id: TaskId,
        /// Its terminal status.
        status: TaskStatus,
    },

    /// The requested status change is not in the transition table.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task that rejected the update.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// A running task reported lower progress than already recorded.
    #[error("progress for task {task_id} cannot decrease from {current} to {requested}")]
    ProgressRegression {
        /// Task that rejected the update.
        task_id: TaskId,
        /// Recorded progress.
        current: Progress,
        /// Reported progress.
        requested: Progress,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
