//! Metrics documents and snapshots.

mod report;
mod snapshot;

pub use report::{MetricsReport, QueueDepth};
pub use snapshot::AgentMetricsSnapshot;
