//! Registration check consulted by status subscriptions.

use crate::agent_registry::domain::AgentId;
use async_trait::async_trait;

/// Answers whether an agent is still registered.
///
/// Status subscriptions close when the agent they follow disappears from the
/// registry.
#[async_trait]
pub trait AgentPresence: Send + Sync {
    /// Returns whether a card is registered for `agent_id`.
    ///
    /// Lookup failures report the agent as present so that a transient store
    /// error does not end a subscription.
    async fn is_registered(&self, agent_id: &AgentId) -> bool;
}
