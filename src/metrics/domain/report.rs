//! Metrics document served by an agent's metrics endpoint.

use serde::{Deserialize, Serialize};

/// Number of tasks waiting in an agent's queue.
///
/// Serialised as a nullable integer; a missing or `null` value is
/// [`QueueDepth::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum QueueDepth {
    /// Depth reported by the agent.
    Known(u32),
    /// Depth could not be determined.
    #[default]
    Unknown,
}

impl QueueDepth {
    /// Returns the depth when known.
    #[must_use]
    pub const fn known(self) -> Option<u32> {
        match self {
            Self::Known(depth) => Some(depth),
            Self::Unknown => None,
        }
    }
}

impl From<Option<u32>> for QueueDepth {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

impl From<QueueDepth> for Option<u32> {
    fn from(value: QueueDepth) -> Self {
        value.known()
    }
}

/// Counters and latencies reported by one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsReport {
    /// Tasks received since the agent started.
    pub tasks_total: u64,
    /// Tasks completed successfully.
    pub tasks_completed: u64,
    /// Tasks that failed.
    pub tasks_failed: u64,
    /// Tasks currently executing.
    pub tasks_running: u64,
    /// Mean response time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time_ms: Option<u64>,
    /// 95th percentile response time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_response_time_ms: Option<u64>,
    /// Tasks waiting to start.
    pub queue_depth: QueueDepth,
    /// Most recent error the agent or the collector observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
