//! Repository port for task persistence, lookup, and child listing.

use crate::task::domain::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Position inside a parent's child list, in creation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChildCursor(usize);

impl ChildCursor {
    /// Cursor at the first child.
    #[must_use]
    pub const fn start() -> Self {
        Self(0)
    }

    /// Cursor at an absolute offset.
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self(offset)
    }

    /// Returns the absolute offset.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// One page of child tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildPage {
    /// Children on this page, in creation order.
    pub tasks: Vec<Task>,
    /// Cursor for the next page; `None` once the list is exhausted.
    pub next: Option<ChildCursor>,
}

/// Task persistence contract.
///
/// Updates are linearised per task: [`TaskRepository::compare_and_swap`]
/// only writes when the stored revision matches the one the caller read.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists or [`TaskRepositoryError::OrphanTask`] when the parent does not.
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find(&self, id: &TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Replaces a stored task when its revision equals `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::RevisionConflict`] when another writer
    /// updated it first.
    async fn compare_and_swap(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> TaskRepositoryResult<()>;

    /// Returns up to `limit` children of `parent` starting at `cursor`.
    async fn children_page(
        &self,
        parent: &TaskId,
        cursor: ChildCursor,
        limit: usize,
    ) -> TaskRepositoryResult<ChildPage>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The declared parent does not exist.
    #[error("task {task_id} references missing parent {parent_id}")]
    OrphanTask {
        /// Rejected task.
        task_id: TaskId,
        /// Missing parent.
        parent_id: TaskId,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored revision differs from the expected one.
    #[error("task {task_id} revision conflict: expected {expected}, found {actual}")]
    RevisionConflict {
        /// Contended task.
        task_id: TaskId,
        /// Revision the writer read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
