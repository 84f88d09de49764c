//! Delegation, failover, aggregation, and synthesis of agent tasks.
//!
//! The orchestrator ties the other modules together: it validates and
//! creates tasks, resolves capabilities against the registry, dispatches
//! through the agent client with bounded failover, follows status until a
//! terminal state, aggregates child results under a configurable
//! completeness policy, and feeds agent metrics back into routing.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::DispatchPhase`], [`domain::Plan`],
//!   [`domain::AggregationSettings`], [`domain::RoutingTable`], and the
//!   settings types
//! - **Services**: [`services::Orchestrator`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
