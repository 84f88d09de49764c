//! Service layer for task creation, status updates, and lookup.

use super::ChildTasks;
use crate::task::{
    domain::{
        FailureKind, NewTask, StatusUpdate, SubTaskSummary, Task, TaskDomainError, TaskFailure,
        TaskId, TaskStatusReport,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of read-apply-swap rounds before an update is reported contended.
const MAX_UPDATE_ATTEMPTS: u32 = 8;

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// A transition rule or value check failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// No task has the identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Concurrent writers kept winning the revision race.
    #[error("task {task_id} update abandoned after {attempts} revision conflicts")]
    ContendedUpdate {
        /// Contended task.
        task_id: TaskId,
        /// Rounds attempted.
        attempts: u32,
    },
}

impl TaskLifecycleError {
    /// Returns whether the error is a duplicate identifier or missing parent
    /// raised at creation.
    #[must_use]
    pub const fn is_creation_conflict(&self) -> bool {
        matches!(
            self,
            Self::Repository(
                TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::OrphanTask { .. }
            )
        )
    }

    /// Returns whether the error rejected a change to a terminal task.
    #[must_use]
    pub const fn is_terminal_mutation(&self) -> bool {
        matches!(
            self,
            Self::Domain(TaskDomainError::TerminalTaskMutation { .. })
        )
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Stores a new pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] wrapping
    /// [`TaskRepositoryError::DuplicateTask`] or
    /// [`TaskRepositoryError::OrphanTask`] when the identifier is taken or the
    /// parent is missing.
    pub async fn create(&self, new_task: NewTask) -> TaskLifecycleResult<Task> {
        let task = Task::new(new_task, &*self.clock);
        self.repository.insert(&task).await?;
        info!(
            task_id = %task.id(),
            parent_id = task.parent_id().map(TaskId::as_str),
            capability = %task.capability(),
            "created task"
        );
        Ok(task)
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find(&self, task_id: &TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find(task_id).await?)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when no task has the
    /// identifier, or [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn get(&self, task_id: &TaskId) -> TaskLifecycleResult<Task> {
        self.find(task_id)
            .await?
            .ok_or_else(|| TaskLifecycleError::NotFound(task_id.clone()))
    }

    /// Applies a status update, re-reading and re-applying on revision
    /// conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the update violates the
    /// transition rules, [`TaskLifecycleError::NotFound`] for an unknown
    /// task, or [`TaskLifecycleError::ContendedUpdate`] when every round lost
    /// the revision race.
    pub async fn update_status(
        &self,
        task_id: &TaskId,
        update: StatusUpdate,
    ) -> TaskLifecycleResult<Task> {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let current = self.get(task_id).await?;
            let expected_revision = current.revision();
            let mut next = current;
            next.apply(update.clone(), &*self.clock)?;

            match self
                .repository
                .compare_and_swap(&next, expected_revision)
                .await
            {
                Ok(()) => {
                    debug!(
                        %task_id,
                        status = %next.status(),
                        progress = %next.progress(),
                        revision = next.revision(),
                        "applied status update"
                    );
                    return Ok(next);
                }
                Err(TaskRepositoryError::RevisionConflict { actual, .. }) => {
                    warn!(%task_id, attempt, actual, "revision conflict; retrying update");
                }
                Err(TaskRepositoryError::NotFound(_)) => {
                    return Err(TaskLifecycleError::NotFound(task_id.clone()));
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(TaskLifecycleError::ContendedUpdate {
            task_id: task_id.clone(),
            attempts: MAX_UPDATE_ATTEMPTS,
        })
    }

    /// Marks a non-terminal task failed with [`FailureKind::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the task is already
    /// terminal, or the lookup errors of [`Self::update_status`].
    pub async fn cancel(&self, task_id: &TaskId, reason: &str) -> TaskLifecycleResult<Task> {
        let cancelled = self
            .update_status(
                task_id,
                StatusUpdate::Failed {
                    failure: TaskFailure::new(FailureKind::Cancelled, reason),
                },
            )
            .await?;
        info!(%task_id, reason, "cancelled task");
        Ok(cancelled)
    }

    /// Returns a restartable listing of a parent's children.
    #[must_use]
    pub fn children(&self, parent: &TaskId) -> ChildTasks<R> {
        ChildTasks::new(Arc::clone(&self.repository), parent.clone())
    }

    /// Collects a parent's children in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when a page cannot be read.
    pub async fn collect_children(&self, parent: &TaskId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.children(parent).collect().await?)
    }

    /// Builds the status document for a task, summarising its children.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for an unknown task, or
    /// [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn status_report(&self, task_id: &TaskId) -> TaskLifecycleResult<TaskStatusReport> {
        let task = self.get(task_id).await?;
        let children = self.collect_children(task_id).await?;
        let report = TaskStatusReport::from_task(&task);
        if children.is_empty() {
            return Ok(report);
        }
        Ok(report.with_sub_tasks(children.iter().map(SubTaskSummary::from_task).collect()))
    }
}
