//! Domain model for task records and status transitions.
//!
//! Tasks carry an opaque JSON payload addressed to a capability. Their status
//! moves from `pending` through `running` to a terminal `completed` or
//! `failed`, after which the record is immutable.

mod error;
mod failure;
mod ids;
mod report;
mod status;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use failure::{FailureKind, TaskFailure};
pub use ids::TaskId;
pub use report::{SubTaskDetail, SubTaskSummary, TaskStatusReport};
pub use status::{Progress, TaskStatus};
pub use task::{NewTask, StatusUpdate, Task};
