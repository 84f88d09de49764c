//! Authentication scheme references declared by Agent Cards.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};

/// How requests to an agent are authenticated.
///
/// Cards reference a scheme rather than carrying credentials; tokens are
/// issued by an external collaborator and attached by the agent client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthScheme {
    /// Requests carry no credentials.
    #[default]
    None,
    /// Requests carry a bearer token issued for `audience`.
    Bearer {
        /// Audience the token is requested for.
        audience: String,
    },
}

impl AuthScheme {
    /// Creates a bearer scheme for the given audience.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyAudience`] when the audience is
    /// empty after trimming.
    pub fn bearer(audience: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let normalized = audience.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyAudience);
        }
        Ok(Self::Bearer {
            audience: normalized,
        })
    }

    /// Returns the bearer audience, if the scheme uses one.
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Bearer { audience } => Some(audience),
        }
    }
}
