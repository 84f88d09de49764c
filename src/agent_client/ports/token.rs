//! Token issuance port.

use crate::agent_client::domain::BearerToken;
use async_trait::async_trait;
use thiserror::Error;

/// Issues bearer tokens for agent audiences.
///
/// Token issuance is owned by an external identity service; the engine only
/// requests and caches tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Issues a token for `audience`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when no token can be issued.
    async fn issue(&self, audience: &str) -> Result<BearerToken, TokenError>;
}

/// Errors returned by token providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The provider has no credential for the audience.
    #[error("no token configured for audience '{0}'")]
    UnknownAudience(String),

    /// The provider failed to issue a token.
    #[error("token issuance for audience '{audience}' failed: {message}")]
    Unavailable {
        /// Requested audience.
        audience: String,
        /// Failure description.
        message: String,
    },
}
