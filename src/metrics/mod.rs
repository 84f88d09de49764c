//! Per-agent operational metrics collection.
//!
//! The collector polls each registered agent's metrics endpoint and keeps
//! the latest snapshot per agent. Collection failures never fail tasks:
//! they produce a synthetic snapshot with an unknown queue depth that the
//! orchestrator treats as a routing downgrade signal.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::MetricsReport`], [`domain::AgentMetricsSnapshot`]
//! - **Ports**: [`ports::MetricsSource`]
//! - **Adapters**: [`adapters::memory::InMemoryMetricsSource`], plus the HTTP
//!   agent transport in [`crate::agent_client::adapters`]
//! - **Services**: [`services::MetricsCollector`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
