//! Port contracts for task persistence.

mod repository;

pub use repository::{
    ChildCursor, ChildPage, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
