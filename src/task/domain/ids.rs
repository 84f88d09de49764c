//! Identifier type for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a task identifier.
const MAX_TASK_ID_LENGTH: usize = 200;

/// Unique identifier for a task record, such as `task-abc123`.
///
/// Identifiers are opaque strings so that callers and agents can choose
/// them; the engine generates `task-<uuid>` for root tasks and derives child
/// identifiers from their parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Creates a validated task identifier.
    ///
    /// The input is trimmed and must not contain whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskId`] when the value is empty after
    /// trimming, [`TaskDomainError::InvalidTaskId`] when it contains
    /// whitespace or control characters, or [`TaskDomainError::TaskIdTooLong`]
    /// when it exceeds 200 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTaskId);
        }
        if normalized.len() > MAX_TASK_ID_LENGTH {
            return Err(TaskDomainError::TaskIdTooLong {
                value: raw,
                limit: MAX_TASK_ID_LENGTH,
            });
        }
        if normalized
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(TaskDomainError::InvalidTaskId(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Creates a new random identifier of the form `task-<uuid>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("task-{}", Uuid::new_v4().simple()))
    }

    /// Derives an identifier of the form `<self>-<suffix>`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the derived identifier is invalid.
    pub fn derive(&self, suffix: &str) -> Result<Self, TaskDomainError> {
        Self::new(format!("{}-{suffix}", self.0))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
