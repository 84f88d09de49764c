//! Port contracts for reaching agents and obtaining credentials.

mod token;
mod transport;

pub use token::{TokenError, TokenProvider};
pub use transport::{AgentTransport, DispatchError, DispatchResult};
