//! In-memory task repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskId},
    ports::{ChildCursor, ChildPage, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    children_index: HashMap<TaskId, Vec<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.tasks.contains_key(task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id().clone()));
        }

        if let Some(parent_id) = task.parent_id() {
            if !state.tasks.contains_key(parent_id) {
                return Err(TaskRepositoryError::OrphanTask {
                    task_id: task.id().clone(),
                    parent_id: parent_id.clone(),
                });
            }
            state
                .children_index
                .entry(parent_id.clone())
                .or_default()
                .push(task.id().clone());
        }

        state.tasks.insert(task.id().clone(), task.clone());
        Ok(())
    }

    async fn find(&self, id: &TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(id).cloned())
    }

    async fn compare_and_swap(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .tasks
            .get_mut(task.id())
            .ok_or_else(|| TaskRepositoryError::NotFound(task.id().clone()))?;

        if stored.revision() != expected_revision {
            return Err(TaskRepositoryError::RevisionConflict {
                task_id: task.id().clone(),
                expected: expected_revision,
                actual: stored.revision(),
            });
        }

        *stored = task.clone();
        Ok(())
    }

    async fn children_page(
        &self,
        parent: &TaskId,
        cursor: ChildCursor,
        limit: usize,
    ) -> TaskRepositoryResult<ChildPage> {
        let state = self.state.read().map_err(poisoned)?;
        let child_ids = state
            .children_index
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let tasks: Vec<Task> = child_ids
            .iter()
            .skip(cursor.offset())
            .take(limit)
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect();

        let consumed = cursor.offset().saturating_add(tasks.len());
        let next = (consumed < child_ids.len() && !tasks.is_empty())
            .then_some(ChildCursor::at(consumed));
        Ok(ChildPage { tasks, next })
    }
}
