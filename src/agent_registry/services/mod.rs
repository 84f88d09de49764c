//! Application services for Agent Card registration and capability
//! resolution.

mod ranking;
mod registry;

pub use ranking::{Candidate, LeastLoadedPolicy, RankingPolicy};
pub use registry::{AgentRegistryError, AgentRegistryResult, AgentRegistryService};
