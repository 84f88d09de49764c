//! Identifier types for chunks and collections.

use super::RetrievalDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkId(String);

impl ChunkId {
    /// Creates a chunk identifier from a trimmed, non-empty value.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalDomainError::EmptyChunkId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, RetrievalDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(RetrievalDomainError::EmptyChunkId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChunkId {
    type Error = RetrievalDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChunkId> for String {
    fn from(value: ChunkId) -> Self {
        value.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a chunk collection such as `pdf_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Creates a validated collection name.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalDomainError::EmptyCollectionName`] when the value is
    /// empty after trimming, or [`RetrievalDomainError::InvalidCollectionName`]
    /// when it contains characters outside `[a-z0-9_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, RetrievalDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(RetrievalDomainError::EmptyCollectionName);
        }
        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !is_valid {
            return Err(RetrievalDomainError::InvalidCollectionName(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CollectionName {
    type Error = RetrievalDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(value: CollectionName) -> Self {
        value.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
