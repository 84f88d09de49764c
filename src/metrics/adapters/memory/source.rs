//! Metrics source serving scripted reports.

use crate::agent_registry::domain::{AgentCard, AgentId};
use crate::metrics::{
    domain::MetricsReport,
    ports::{MetricsSource, MetricsSourceError},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe metrics source answering from a per-agent table.
///
/// Agents without an entry are unreachable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsSource {
    reports: Arc<RwLock<HashMap<AgentId, Result<MetricsReport, String>>>>,
}

impl InMemoryMetricsSource {
    /// Creates a source with no published metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the report served for an agent.
    pub fn set_report(&self, agent_id: &AgentId, report: MetricsReport) {
        self.reports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent_id.clone(), Ok(report));
    }

    /// Makes collection for an agent fail with `message`.
    pub fn set_failure(&self, agent_id: &AgentId, message: impl Into<String>) {
        self.reports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent_id.clone(), Err(message.into()));
    }
}

#[async_trait]
impl MetricsSource for InMemoryMetricsSource {
    async fn fetch(&self, card: &AgentCard) -> Result<MetricsReport, MetricsSourceError> {
        let reports = self.reports.read().unwrap_or_else(PoisonError::into_inner);
        match reports.get(card.agent_id()) {
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(message)) => Err(MetricsSourceError::Unreachable {
                agent_id: card.agent_id().clone(),
                message: message.clone(),
            }),
            None => Err(MetricsSourceError::Unreachable {
                agent_id: card.agent_id().clone(),
                message: "no metrics published".to_owned(),
            }),
        }
    }
}
