//! Agent transport, authentication, and status delivery for Gropius.
//!
//! The agent client sends task-creation requests to a resolved agent's
//! endpoint, polls the agent's status endpoint, and turns polling into a
//! de-duplicated stream of status events. Transport faults (which may be
//! retried against another agent) are kept distinct from application
//! rejections (which may not). The module follows hexagonal architecture:
//!
//! - Wire types in [`domain`]
//! - Transport and token contracts in [`ports`]
//! - HTTP and in-memory adapters in [`adapters`]
//! - Client services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
