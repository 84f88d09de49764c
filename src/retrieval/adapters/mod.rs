//! Vector-store adapters.

pub mod memory;
