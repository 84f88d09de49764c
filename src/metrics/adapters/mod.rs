//! Metrics source adapters.

pub mod memory;
