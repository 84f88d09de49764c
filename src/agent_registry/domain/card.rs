//! Agent Card aggregate.

use super::{
    AgentEndpoints, AgentId, AuthScheme, Capability, CapabilityId, OperatingMetadata,
    RegistryDomainError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Self-description an agent publishes: identity, capabilities, endpoints,
/// authentication scheme and operating metadata.
///
/// Cards are immutable once built. Re-registration replaces a card
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AgentCardDocument")]
pub struct AgentCard {
    agent_id: AgentId,
    capabilities: Vec<Capability>,
    endpoints: AgentEndpoints,
    authentication: AuthScheme,
    metadata: OperatingMetadata,
}

/// Unvalidated Agent Card document as published by an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentCardDocument {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Endpoint templates.
    pub endpoints: AgentEndpoints,
    /// Authentication scheme; `none` when omitted.
    #[serde(default)]
    pub authentication: AuthScheme,
    /// Operating metadata.
    pub metadata: OperatingMetadata,
}

impl TryFrom<AgentCardDocument> for AgentCard {
    type Error = RegistryDomainError;

    fn try_from(document: AgentCardDocument) -> Result<Self, Self::Error> {
        let AgentCardDocument {
            agent_id,
            capabilities,
            endpoints,
            authentication,
            metadata,
        } = document;
        Self::new(agent_id, capabilities, endpoints, metadata)?.with_authentication(authentication)
    }
}

impl AgentCard {
    /// Creates a validated card with no authentication.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::NoCapabilities`] when `capabilities` is
    /// empty or [`RegistryDomainError::DuplicateCapability`] when a capability
    /// id repeats.
    pub fn new(
        agent_id: AgentId,
        capabilities: Vec<Capability>,
        endpoints: AgentEndpoints,
        metadata: OperatingMetadata,
    ) -> Result<Self, RegistryDomainError> {
        if capabilities.is_empty() {
            return Err(RegistryDomainError::NoCapabilities(agent_id));
        }

        let mut seen = HashSet::with_capacity(capabilities.len());
        if let Some(repeated) = capabilities
            .iter()
            .find(|capability| !seen.insert(capability.id()))
        {
            return Err(RegistryDomainError::DuplicateCapability {
                capability: repeated.id().clone(),
                agent_id,
            });
        }

        Ok(Self {
            agent_id,
            capabilities,
            endpoints,
            authentication: AuthScheme::None,
            metadata,
        })
    }

    /// Parses and validates a card from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the document is malformed or fails
    /// card validation.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Sets the authentication scheme.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyAudience`] when a bearer scheme has
    /// a blank audience.
    pub fn with_authentication(
        mut self,
        authentication: AuthScheme,
    ) -> Result<Self, RegistryDomainError> {
        if let AuthScheme::Bearer { audience } = &authentication
            && audience.trim().is_empty()
        {
            return Err(RegistryDomainError::EmptyAudience);
        }
        self.authentication = authentication;
        Ok(self)
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the declared capabilities in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns the declared capability with the given id.
    #[must_use]
    pub fn capability(&self, id: &CapabilityId) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|capability| capability.id() == id)
    }

    /// Returns whether the card declares the capability.
    #[must_use]
    pub fn offers(&self, id: &CapabilityId) -> bool {
        self.capability(id).is_some()
    }

    /// Returns the endpoint templates.
    #[must_use]
    pub const fn endpoints(&self) -> &AgentEndpoints {
        &self.endpoints
    }

    /// Returns the authentication scheme.
    #[must_use]
    pub const fn authentication(&self) -> &AuthScheme {
        &self.authentication
    }

    /// Returns the operating metadata.
    #[must_use]
    pub const fn metadata(&self) -> &OperatingMetadata {
        &self.metadata
    }
}

/// A stored card together with its registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCard {
    card: AgentCard,
    position: u64,
}

impl RegisteredCard {
    /// Pairs a card with its insertion position.
    #[must_use]
    pub const fn new(card: AgentCard, position: u64) -> Self {
        Self { card, position }
    }

    /// Returns the card.
    #[must_use]
    pub const fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Returns the position assigned at first registration.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Consumes the record, returning the card.
    #[must_use]
    pub fn into_card(self) -> AgentCard {
        self.card
    }
}

/// Effect of storing a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// No card with this agent id existed.
    Inserted,
    /// A different card with this agent id was replaced.
    Replaced,
    /// An identical card was already stored.
    Unchanged,
}
