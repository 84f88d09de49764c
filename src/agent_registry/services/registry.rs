//! Service layer for Agent Card registration and capability resolution.
//!
//! Provides [`AgentRegistryService`] which validates and stores cards, and
//! resolves a capability to a ranked list of candidate agents.

use super::ranking::{Candidate, LeastLoadedPolicy, RankingPolicy};
use crate::agent_registry::{
    domain::{
        AgentCard, AgentId, CapabilityId, RegisteredCard, RegistrationOutcome, RegistryDomainError,
        RoutingView, SchemaDescriptor,
    },
    ports::{AgentCardRepository, AgentCardRepositoryError, AgentPresence},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum AgentRegistryError {
    /// Card validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),

    /// A card document could not be parsed or failed validation.
    #[error("invalid agent card document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AgentCardRepositoryError),

    /// No registered card declares the capability.
    #[error("no registered agent offers capability {0}")]
    NoCapableAgent(CapabilityId),
}

/// Result type for registry service operations.
pub type AgentRegistryResult<T> = Result<T, AgentRegistryError>;

/// Agent Card registration and resolution service.
pub struct AgentRegistryService<R>
where
    R: AgentCardRepository,
{
    repository: Arc<R>,
    policy: Arc<dyn RankingPolicy>,
}

impl<R> Clone for AgentRegistryService<R>
where
    R: AgentCardRepository,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<R> AgentRegistryService<R>
where
    R: AgentCardRepository,
{
    /// Creates a registry service ranking with [`LeastLoadedPolicy`].
    #[must_use]
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_policy(repository, Arc::new(LeastLoadedPolicy))
    }

    /// Creates a registry service with a custom ranking policy.
    #[must_use]
    pub fn with_policy(repository: Arc<R>, policy: Arc<dyn RankingPolicy>) -> Self {
        Self { repository, policy }
    }

    /// Stores a validated card, replacing any card with the same agent id.
    ///
    /// Registering an identical card again is a no-op. A replaced card keeps
    /// its original registration position.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Repository`] when persistence fails.
    pub async fn register(&self, card: AgentCard) -> AgentRegistryResult<RegistrationOutcome> {
        let outcome = self.repository.upsert(&card).await?;
        match outcome {
            RegistrationOutcome::Inserted => info!(
                agent_id = %card.agent_id(),
                capabilities = card.capabilities().len(),
                "registered agent card"
            ),
            RegistrationOutcome::Replaced => {
                info!(agent_id = %card.agent_id(), "replaced agent card");
            }
            RegistrationOutcome::Unchanged => {
                debug!(agent_id = %card.agent_id(), "agent card unchanged");
            }
        }
        Ok(outcome)
    }

    /// Parses, validates and stores a card from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::InvalidDocument`] when the document is
    /// malformed or invalid, or [`AgentRegistryError::Repository`] when
    /// persistence fails.
    pub async fn register_document(&self, document: &str) -> AgentRegistryResult<AgentCard> {
        let card = AgentCard::from_json(document)?;
        self.register(card.clone()).await?;
        Ok(card)
    }

    /// Removes an agent's card.
    ///
    /// Returns `Ok(None)` when the agent was not registered.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Repository`] when persistence fails.
    pub async fn deregister(&self, agent_id: &AgentId) -> AgentRegistryResult<Option<AgentCard>> {
        let removed = self.repository.remove(agent_id).await?;
        if removed.is_some() {
            info!(%agent_id, "deregistered agent card");
        }
        Ok(removed)
    }

    /// Finds an agent's card.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Repository`] when persistence fails.
    pub async fn find(&self, agent_id: &AgentId) -> AgentRegistryResult<Option<AgentCard>> {
        Ok(self
            .repository
            .find(agent_id)
            .await?
            .map(RegisteredCard::into_card))
    }

    /// Returns every registered card in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Repository`] when persistence fails.
    pub async fn list(&self) -> AgentRegistryResult<Vec<AgentCard>> {
        Ok(self
            .repository
            .list_all()
            .await?
            .into_iter()
            .map(RegisteredCard::into_card)
            .collect())
    }

    /// Resolves a capability to candidate cards, best first.
    ///
    /// The order is a pure function of the registered cards and `view`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::NoCapableAgent`] when no card declares
    /// the capability, or [`AgentRegistryError::Repository`] when persistence
    /// fails.
    pub async fn resolve(
        &self,
        capability: &CapabilityId,
        view: &RoutingView,
    ) -> AgentRegistryResult<Vec<AgentCard>> {
        let offering = self.repository.list_offering(capability).await?;
        if offering.is_empty() {
            return Err(AgentRegistryError::NoCapableAgent(capability.clone()));
        }

        let mut candidates: Vec<Candidate<'_>> = offering
            .iter()
            .map(|registered| Candidate {
                card: registered.card(),
                position: registered.position(),
                signal: view.signal(registered.card().agent_id()),
            })
            .collect();
        candidates.sort_by(|left, right| self.policy.compare(left, right));

        debug!(
            %capability,
            candidates = candidates.len(),
            "resolved capability candidates"
        );
        Ok(candidates
            .into_iter()
            .map(|candidate| candidate.card.clone())
            .collect())
    }

    /// Returns the input schema declared for a capability by the earliest
    /// registered card offering it.
    ///
    /// Returns `Ok(None)` when no card offers the capability.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Repository`] when persistence fails.
    pub async fn input_schema_for(
        &self,
        capability: &CapabilityId,
    ) -> AgentRegistryResult<Option<SchemaDescriptor>> {
        let offering = self.repository.list_offering(capability).await?;
        Ok(offering.first().and_then(|registered| {
            registered
                .card()
                .capability(capability)
                .map(|declared| declared.input_schema().clone())
        }))
    }
}

#[async_trait]
impl<R> AgentPresence for AgentRegistryService<R>
where
    R: AgentCardRepository + 'static,
{
    async fn is_registered(&self, agent_id: &AgentId) -> bool {
        match self.repository.find(agent_id).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!(%agent_id, error = %err, "registration lookup failed; assuming present");
                true
            }
        }
    }
}
