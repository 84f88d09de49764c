//! Adapter implementations for Agent Card storage.

pub mod memory;
