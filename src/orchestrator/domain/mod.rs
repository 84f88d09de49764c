//! Orchestrator-side state and policies.

mod aggregation;
mod phase;
mod plan;
mod routing;
mod settings;

pub use aggregation::{
    AggregatedContext, AggregationDecision, AggregationSettings, ChildTally, Finding,
};
pub use phase::DispatchPhase;
pub use plan::{Plan, PlanError};
pub use routing::{Downgrade, DowngradeReason, RoutingSettings, RoutingTable};
pub use settings::{DispatchSettings, OrchestratorSettings, PipelineCapabilities};
