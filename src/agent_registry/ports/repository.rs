//! Repository port for Agent Card persistence and capability lookup.

use crate::agent_registry::domain::{
    AgentCard, AgentId, CapabilityId, RegisteredCard, RegistrationOutcome,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for Agent Card repository operations.
pub type AgentCardRepositoryResult<T> = Result<T, AgentCardRepositoryError>;

/// Agent Card persistence contract.
///
/// Implementations assign each agent id a position on first insertion and
/// keep it when the card is replaced, so that listings stay in registration
/// order across re-registration.
#[async_trait]
pub trait AgentCardRepository: Send + Sync {
    /// Stores a card, replacing any card with the same agent id.
    ///
    /// # Errors
    ///
    /// Returns [`AgentCardRepositoryError::Persistence`] when the store fails.
    async fn upsert(&self, card: &AgentCard) -> AgentCardRepositoryResult<RegistrationOutcome>;

    /// Removes the card for an agent, returning it when one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`AgentCardRepositoryError::Persistence`] when the store fails.
    async fn remove(&self, agent_id: &AgentId) -> AgentCardRepositoryResult<Option<AgentCard>>;

    /// Finds the card for an agent.
    ///
    /// Returns `None` when the agent is not registered.
    async fn find(&self, agent_id: &AgentId) -> AgentCardRepositoryResult<Option<RegisteredCard>>;

    /// Returns every stored card in registration order.
    async fn list_all(&self) -> AgentCardRepositoryResult<Vec<RegisteredCard>>;

    /// Returns the cards declaring `capability`, in registration order.
    async fn list_offering(
        &self,
        capability: &CapabilityId,
    ) -> AgentCardRepositoryResult<Vec<RegisteredCard>>;
}

/// Errors returned by Agent Card repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AgentCardRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentCardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
