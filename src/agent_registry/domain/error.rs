//! Error types for Agent Card validation.

use super::{AgentId, CapabilityId};
use thiserror::Error;

/// Errors returned while constructing Agent Card domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The agent identifier is empty after trimming.
    #[error("agent id must not be empty")]
    EmptyAgentId,

    /// The agent identifier contains characters outside `[A-Za-z0-9._-]`.
    #[error(
        "agent id '{0}' contains invalid characters (only alphanumeric, '.', '_' and '-' allowed)"
    )]
    InvalidAgentId(String),

    /// The capability identifier is empty after trimming.
    #[error("capability id must not be empty")]
    EmptyCapabilityId,

    /// The capability identifier contains characters outside `[a-z0-9._-]`.
    #[error(
        "capability id '{0}' contains invalid characters (only lowercase alphanumeric, '.', '_' and '-' allowed)"
    )]
    InvalidCapabilityId(String),

    /// An identifier exceeds the storage limit.
    #[error("identifier exceeds {limit} character limit: {value}")]
    IdentifierTooLong {
        /// The rejected value.
        value: String,
        /// Maximum permitted length.
        limit: usize,
    },

    /// The card declares no capabilities.
    #[error("agent card {0} must declare at least one capability")]
    NoCapabilities(AgentId),

    /// The card declares the same capability twice.
    #[error("agent card {agent_id} declares capability {capability} more than once")]
    DuplicateCapability {
        /// Card owning the duplicate.
        agent_id: AgentId,
        /// Repeated capability.
        capability: CapabilityId,
    },

    /// The endpoint base URL is empty.
    #[error("agent endpoint base URL must not be empty")]
    EmptyBaseUrl,

    /// The endpoint base URL does not start with `http://` or `https://`.
    #[error("agent endpoint base URL '{0}' must start with 'http://' or 'https://'")]
    InvalidBaseUrl(String),

    /// A path template is empty.
    #[error("agent endpoint template '{0}' must not be empty")]
    EmptyPathTemplate(String),

    /// A path template lacks its required placeholder.
    #[error("agent endpoint template '{template}' must contain '{placeholder}'")]
    MissingPlaceholder {
        /// The template as declared.
        template: String,
        /// Placeholder the template must carry.
        placeholder: String,
    },

    /// A bearer scheme was declared without an audience.
    #[error("bearer authentication requires a non-empty audience")]
    EmptyAudience,

    /// The operating metadata names no backend.
    #[error("operating metadata backend must not be empty")]
    EmptyBackend,

    /// The operating metadata allows no concurrent tasks.
    #[error("operating metadata concurrency limit must be positive")]
    ZeroConcurrencyLimit,
}
