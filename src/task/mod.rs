//! Task records and lifecycle management for Gropius.
//!
//! The task store is the durable record of every task the engine creates:
//! root queries, research sub-tasks, and synthesis tasks. It enforces parent
//! existence at creation, the status transition table, terminal-state
//! immutability, and monotonic progress, and it linearises updates per task
//! through a revision counter. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Lifecycle services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
