//! Port contracts for Agent Card storage and registration lookup.
//!
//! Ports define infrastructure-agnostic interfaces used by registry services
//! and by the components that consult the registry.

pub mod presence;
pub mod repository;

pub use presence::AgentPresence;
pub use repository::{AgentCardRepository, AgentCardRepositoryError, AgentCardRepositoryResult};
