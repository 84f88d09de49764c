//! Adapter implementations for agent transports and token providers.

mod http;
pub mod memory;

pub use http::HttpAgentTransport;
