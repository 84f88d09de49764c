//! Gropius: task orchestration for cooperating AI agents.
//!
//! This crate coordinates planner, researcher, and synthesizer agents that
//! run as independent processes. It creates tasks, delegates them by
//! capability, tracks their status, fails over between agents, aggregates
//! child results, and dispatches the final synthesis.
//!
//! # Architecture
//!
//! Gropius follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (HTTP, in-memory, etc.)
//!
//! # Modules
//!
//! - [`agent_registry`]: Agent Card registration and capability resolution
//! - [`task`]: Task records, parent/child links, and status lifecycle
//! - [`agent_client`]: Dispatching tasks to agents and following status
//! - [`metrics`]: Per-agent operational metrics collection
//! - [`orchestrator`]: Delegation, failover, aggregation, and synthesis
//! - [`retrieval`]: Vector-store query contract with access trimming
//! - [`config`]: Engine configuration loaded from TOML
//! - [`engine`]: Wiring of the production adapters and the metrics loop

pub mod agent_client;
pub mod agent_registry;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod orchestrator;
pub mod retrieval;
pub mod task;
pub mod telemetry;
