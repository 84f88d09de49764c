//! Collector keeping the latest metrics snapshot per agent.

use crate::agent_registry::domain::{AgentCard, AgentId};
use crate::metrics::{domain::AgentMetricsSnapshot, ports::MetricsSource};
use futures::future::join_all;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument, warn};

/// Collects agent metrics and keeps the most recent snapshot of each agent.
///
/// Snapshots are overwritten on every collection and never persisted.
pub struct MetricsCollector<S, C>
where
    S: MetricsSource,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    clock: Arc<C>,
    snapshots: Arc<RwLock<HashMap<AgentId, AgentMetricsSnapshot>>>,
}

impl<S, C> Clone for MetricsCollector<S, C>
where
    S: MetricsSource,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            clock: Arc::clone(&self.clock),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}

impl<S, C> MetricsCollector<S, C>
where
    S: MetricsSource,
    C: Clock + Send + Sync,
{
    /// Creates a collector with no snapshots.
    #[must_use]
    pub fn new(source: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            source,
            clock,
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Collects and records the metrics of one agent.
    ///
    /// A failed fetch records a synthetic snapshot with an unknown queue
    /// depth and the failure in `last_error`.
    #[instrument(skip(self, card), fields(agent_id = %card.agent_id()))]
    pub async fn collect(&self, card: &AgentCard) -> AgentMetricsSnapshot {
        let snapshot = match self.source.fetch(card).await {
            Ok(report) => {
                debug!(queue_depth = ?report.queue_depth, "collected agent metrics");
                AgentMetricsSnapshot::new(card.agent_id().clone(), report, self.clock.utc())
            }
            Err(err) => {
                warn!(error = %err, "metrics collection failed");
                AgentMetricsSnapshot::unreachable(
                    card.agent_id().clone(),
                    err.to_string(),
                    self.clock.utc(),
                )
            }
        };

        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(card.agent_id().clone(), snapshot.clone());
        snapshot
    }

    /// Collects the metrics of every card concurrently.
    ///
    /// Snapshots are returned in the order of `cards`.
    #[instrument(skip(self, cards), fields(agents = cards.len()))]
    pub async fn collect_all(&self, cards: &[AgentCard]) -> Vec<AgentMetricsSnapshot> {
        join_all(cards.iter().map(|card| self.collect(card))).await
    }

    /// Returns the latest snapshot of an agent.
    #[must_use]
    pub fn snapshot(&self, agent_id: &AgentId) -> Option<AgentMetricsSnapshot> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent_id)
            .cloned()
    }

    /// Returns the latest snapshot of every agent, ordered by agent id.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AgentMetricsSnapshot> {
        let mut snapshots: Vec<_> = self
            .snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        snapshots.sort_by(|left, right| left.agent_id().cmp(right.agent_id()));
        snapshots
    }

    /// Drops the snapshot of an agent that left the registry.
    pub fn forget(&self, agent_id: &AgentId) {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent_id);
    }
}
