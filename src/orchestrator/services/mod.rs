//! Orchestrator services.

mod orchestrator;
mod pipeline;

pub use orchestrator::{Orchestrator, OrchestratorError, OrchestratorResult};
pub use pipeline::QueryOutcome;
