//! Identifier types for the Agent Card domain.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for an agent identifier.
const MAX_AGENT_ID_LENGTH: usize = 128;

/// Maximum length for a capability identifier.
const MAX_CAPABILITY_ID_LENGTH: usize = 100;

/// Validated identity of one registered agent instance.
///
/// Agent identifiers are chosen by the agent process (for example
/// `researcher-1`) and are stable across re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Creates a validated agent identifier.
    ///
    /// The input is trimmed. Only characters in `[A-Za-z0-9._-]` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyAgentId`] when the value is empty
    /// after trimming, [`RegistryDomainError::InvalidAgentId`] when it
    /// contains other characters, or [`RegistryDomainError::IdentifierTooLong`]
    /// when it exceeds 128 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyAgentId);
        }
        if normalized.len() > MAX_AGENT_ID_LENGTH {
            return Err(RegistryDomainError::IdentifierTooLong {
                value: raw,
                limit: MAX_AGENT_ID_LENGTH,
            });
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !is_valid {
            return Err(RegistryDomainError::InvalidAgentId(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AgentId {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated name of a unit of work an agent can perform.
///
/// Capability names are lowercase (for example `analyze-query` or
/// `retrieve-from-documents`); input is lowercased before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityId(String);

impl CapabilityId {
    /// Creates a validated capability identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyCapabilityId`] when the value is
    /// empty after trimming, [`RegistryDomainError::InvalidCapabilityId`] when
    /// it contains characters outside `[a-z0-9._-]`, or
    /// [`RegistryDomainError::IdentifierTooLong`] when it exceeds 100
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyCapabilityId);
        }
        if normalized.len() > MAX_CAPABILITY_ID_LENGTH {
            return Err(RegistryDomainError::IdentifierTooLong {
                value: raw,
                limit: MAX_CAPABILITY_ID_LENGTH,
            });
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
        if !is_valid {
            return Err(RegistryDomainError::InvalidCapabilityId(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CapabilityId {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CapabilityId> for String {
    fn from(value: CapabilityId) -> Self {
        value.0
    }
}

impl AsRef<str> for CapabilityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
