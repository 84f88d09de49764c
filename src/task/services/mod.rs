//! Application services for task lifecycle management.

mod children;
mod lifecycle;

pub use children::ChildTasks;
pub use lifecycle::{TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService};
