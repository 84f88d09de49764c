//! Tunables for delegation and the query pipeline.

use super::{AggregationSettings, RoutingSettings};
use crate::agent_client::services::PollSettings;
use crate::agent_registry::domain::CapabilityId;
use std::time::Duration;

/// Failover and retry bounds for delegating one task.
///
/// A pass tries the ranked candidates in order, untried agents first, at
/// most `max_attempts` of them. After a pass in which every attempt failed
/// with a transport fault, up to `retry_budget` further passes run, each
/// after `retry_backoff`. Passes continue past the budget while some ranked
/// candidate has not been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Candidates tried per pass; zero is treated as one.
    pub max_attempts: u32,
    /// Extra passes after the first.
    pub retry_budget: u32,
    /// Delay before each extra pass.
    pub retry_backoff: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_budget: 1,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl DispatchSettings {
    /// Settings trying each candidate once with no extra passes.
    #[must_use]
    pub const fn single_pass(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_budget: 0,
            retry_backoff: Duration::ZERO,
        }
    }
}

/// Capabilities used by the three pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCapabilities {
    /// Capability turning a query into a plan.
    pub planner: CapabilityId,
    /// Capability executing one plan step.
    pub researcher: CapabilityId,
    /// Capability combining findings into an answer.
    pub synthesizer: CapabilityId,
}

impl PipelineCapabilities {
    /// Groups the stage capabilities.
    #[must_use]
    pub const fn new(
        planner: CapabilityId,
        researcher: CapabilityId,
        synthesizer: CapabilityId,
    ) -> Self {
        Self {
            planner,
            researcher,
            synthesizer,
        }
    }
}

/// Everything the orchestrator is tuned by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Failover and retry bounds.
    pub dispatch: DispatchSettings,
    /// Child completeness policy.
    pub aggregation: AggregationSettings,
    /// Metrics-driven downgrade policy.
    pub routing: RoutingSettings,
    /// Status polling of delegated tasks.
    pub tracking: PollSettings,
    /// Pipeline stage capabilities.
    pub pipeline: PipelineCapabilities,
}

impl OrchestratorSettings {
    /// Default tunables for the given pipeline.
    #[must_use]
    pub fn new(pipeline: PipelineCapabilities) -> Self {
        Self {
            dispatch: DispatchSettings::default(),
            aggregation: AggregationSettings::default(),
            routing: RoutingSettings::default(),
            tracking: PollSettings::default(),
            pipeline,
        }
    }
}
