//! Agent Card registration and capability resolution for Gropius.
//!
//! Agents advertise what they can do through Agent Cards: declared
//! capabilities with input and output schema descriptors, endpoint templates,
//! an authentication scheme, and operating metadata. The registry stores the
//! cards and resolves a capability name to a ranked list of candidate agents
//! during delegation. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Registry services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
