//! In-memory agent transport and static token provider.

mod tokens;
mod transport;

pub use tokens::StaticTokenProvider;
pub use transport::{AgentBehaviour, DispatchRecord, InMemoryAgentTransport, Responder};
