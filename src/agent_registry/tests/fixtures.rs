//! Card builders shared by unit tests across modules.

use crate::agent_registry::domain::{
    AgentCard, AgentEndpoints, AgentId, Capability, CapabilityId, OperatingMetadata,
};

/// Builds an agent identifier, panicking on invalid test input.
pub(crate) fn agent_id(raw: &str) -> AgentId {
    AgentId::new(raw).expect("valid agent id")
}

/// Builds a capability identifier, panicking on invalid test input.
pub(crate) fn capability_id(raw: &str) -> CapabilityId {
    CapabilityId::new(raw).expect("valid capability id")
}

/// Builds a card reachable at `base_url` offering `capabilities`.
pub(crate) fn card_at(agent: &str, base_url: &str, capabilities: &[&str]) -> AgentCard {
    let endpoints = AgentEndpoints::new(base_url, "/v1/tasks", "/v1/tasks/{task_id}")
        .expect("valid endpoints");
    let metadata = OperatingMetadata::new("ollama", 4, 2_000).expect("valid metadata");
    AgentCard::new(
        agent_id(agent),
        capabilities
            .iter()
            .map(|raw| Capability::new(capability_id(raw)))
            .collect(),
        endpoints,
        metadata,
    )
    .expect("valid card")
}

/// Builds a card with a placeholder base URL derived from the agent id.
pub(crate) fn card(agent: &str, capabilities: &[&str]) -> AgentCard {
    card_at(agent, &format!("http://{agent}.agents.test"), capabilities)
}
