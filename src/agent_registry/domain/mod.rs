//! Domain model for Agent Cards and capability routing.
//!
//! Cards are validated on construction and on deserialisation, so every
//! [`AgentCard`] held by the registry is well-formed. Routing signals are
//! plain values handed to the registry at resolution time; the registry never
//! reads metrics state on its own.

mod auth;
mod capability;
mod card;
mod endpoint;
mod error;
mod ids;
mod metadata;
mod routing;
mod schema;

pub use auth::AuthScheme;
pub use capability::Capability;
pub use card::{AgentCard, AgentCardDocument, RegisteredCard, RegistrationOutcome};
pub use endpoint::AgentEndpoints;
pub use error::RegistryDomainError;
pub use ids::{AgentId, CapabilityId};
pub use metadata::OperatingMetadata;
pub use routing::{LoadSignal, RoutingView};
pub use schema::{SchemaDescriptor, SchemaKind, SchemaMismatch};
