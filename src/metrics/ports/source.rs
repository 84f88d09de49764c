//! Metrics source port.

use crate::agent_registry::domain::{AgentCard, AgentId};
use crate::metrics::domain::MetricsReport;
use async_trait::async_trait;
use thiserror::Error;

/// Fetches the metrics document an agent publishes.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetches the current metrics of the agent described by `card`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsSourceError`] when the metrics cannot be retrieved
    /// or decoded.
    async fn fetch(&self, card: &AgentCard) -> Result<MetricsReport, MetricsSourceError>;
}

/// Errors returned by metrics sources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricsSourceError {
    /// The metrics endpoint could not be reached or answered with an error.
    #[error("metrics of agent {agent_id} unreachable: {message}")]
    Unreachable {
        /// Agent whose metrics were requested.
        agent_id: AgentId,
        /// Failure description.
        message: String,
    },

    /// The metrics document could not be decoded.
    #[error("metrics of agent {agent_id} malformed: {message}")]
    Malformed {
        /// Agent whose metrics were requested.
        agent_id: AgentId,
        /// Decoding failure.
        message: String,
    },
}
