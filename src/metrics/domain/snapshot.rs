//! Timestamped per-agent metrics snapshots.

use super::{MetricsReport, QueueDepth};
use crate::agent_registry::domain::{AgentId, LoadSignal};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest metrics known for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentMetricsSnapshot {
    agent_id: AgentId,
    collected_at: DateTime<Utc>,
    #[serde(flatten)]
    metrics: MetricsReport,
}

impl AgentMetricsSnapshot {
    /// Wraps a report fetched from an agent.
    #[must_use]
    pub const fn new(
        agent_id: AgentId,
        metrics: MetricsReport,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_id,
            collected_at,
            metrics,
        }
    }

    /// Builds the synthetic snapshot recorded when collection fails.
    ///
    /// Counters are zero, latencies and queue depth are unknown, and
    /// `last_error` holds the failure.
    #[must_use]
    pub fn unreachable(
        agent_id: AgentId,
        error: impl Into<String>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let metrics = MetricsReport {
            last_error: Some(error.into()),
            ..MetricsReport::default()
        };
        Self::new(agent_id, metrics, collected_at)
    }

    /// Returns the agent the snapshot describes.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    /// Returns the reported metrics.
    #[must_use]
    pub const fn metrics(&self) -> &MetricsReport {
        &self.metrics
    }

    /// Returns the queue depth.
    #[must_use]
    pub const fn queue_depth(&self) -> QueueDepth {
        self.metrics.queue_depth
    }

    /// Returns whether the snapshot carries no usable load information.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self.metrics.queue_depth, QueueDepth::Unknown)
    }

    /// Returns the load signal this snapshot contributes to routing.
    #[must_use]
    pub const fn load_signal(&self) -> LoadSignal {
        LoadSignal {
            queue_depth: self.metrics.queue_depth.known(),
            avg_response_time_ms: self.metrics.avg_response_time_ms,
            downgraded: false,
        }
    }
}
