//! In-memory Agent Card repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::agent_registry::{
    domain::{AgentCard, AgentId, CapabilityId, RegisteredCard, RegistrationOutcome},
    ports::{AgentCardRepository, AgentCardRepositoryError, AgentCardRepositoryResult},
};

/// Thread-safe in-memory Agent Card repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentCardRepository {
    state: Arc<RwLock<InMemoryCardState>>,
}

#[derive(Debug, Default)]
struct InMemoryCardState {
    cards: HashMap<AgentId, RegisteredCard>,
    next_position: u64,
}

impl InMemoryAgentCardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_registration_order<'a>(
    cards: impl Iterator<Item = &'a RegisteredCard>,
) -> Vec<RegisteredCard> {
    let mut selected: Vec<RegisteredCard> = cards.cloned().collect();
    selected.sort_by_key(RegisteredCard::position);
    selected
}

fn poisoned(err: impl std::fmt::Display) -> AgentCardRepositoryError {
    AgentCardRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AgentCardRepository for InMemoryAgentCardRepository {
    async fn upsert(&self, card: &AgentCard) -> AgentCardRepositoryResult<RegistrationOutcome> {
        let mut state = self.state.write().map_err(poisoned)?;

        if let Some(existing) = state.cards.get(card.agent_id()) {
            if existing.card() == card {
                return Ok(RegistrationOutcome::Unchanged);
            }
            let position = existing.position();
            state.cards.insert(
                card.agent_id().clone(),
                RegisteredCard::new(card.clone(), position),
            );
            return Ok(RegistrationOutcome::Replaced);
        }

        let position = state.next_position;
        state.next_position += 1;
        state.cards.insert(
            card.agent_id().clone(),
            RegisteredCard::new(card.clone(), position),
        );
        Ok(RegistrationOutcome::Inserted)
    }

    async fn remove(&self, agent_id: &AgentId) -> AgentCardRepositoryResult<Option<AgentCard>> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.cards.remove(agent_id).map(RegisteredCard::into_card))
    }

    async fn find(&self, agent_id: &AgentId) -> AgentCardRepositoryResult<Option<RegisteredCard>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.cards.get(agent_id).cloned())
    }

    async fn list_all(&self) -> AgentCardRepositoryResult<Vec<RegisteredCard>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(in_registration_order(state.cards.values()))
    }

    async fn list_offering(
        &self,
        capability: &CapabilityId,
    ) -> AgentCardRepositoryResult<Vec<RegisteredCard>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(in_registration_order(
            state
                .cards
                .values()
                .filter(|registered| registered.card().offers(capability)),
        ))
    }
}
