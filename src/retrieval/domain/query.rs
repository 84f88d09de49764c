//! Similarity queries, caller identity, and ranked results.

use super::{ChunkId, CollectionName, DocumentChunk, Embedding, RetrievalDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Number of chunks returned when a query sets no limit.
pub const DEFAULT_RESULT_LIMIT: usize = 3;

/// Who is asking, as far as document access is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    principal: String,
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl CallerIdentity {
    /// Creates an identity belonging to `groups`.
    #[must_use]
    pub fn new<I, S>(principal: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal: principal.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an identity with no group memberships.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the principal name.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the caller's groups.
    #[must_use]
    pub const fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Returns whether the caller may read `chunk`.
    #[must_use]
    pub fn can_read(&self, chunk: &DocumentChunk) -> bool {
        chunk.access_groups().is_empty() || !chunk.access_groups().is_disjoint(&self.groups)
    }
}

/// A nearest-neighbour query against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    collection: CollectionName,
    embedding: Embedding,
    limit: usize,
}

impl RetrievalQuery {
    /// Creates a query returning up to [`DEFAULT_RESULT_LIMIT`] chunks.
    #[must_use]
    pub const fn new(collection: CollectionName, embedding: Embedding) -> Self {
        Self {
            collection,
            embedding,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Sets the maximum number of chunks returned.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalDomainError::ZeroLimit`] when `limit` is zero.
    pub fn with_limit(mut self, limit: usize) -> Result<Self, RetrievalDomainError> {
        if limit == 0 {
            return Err(RetrievalDomainError::ZeroLimit);
        }
        self.limit = limit;
        Ok(self)
    }

    /// Returns the queried collection.
    #[must_use]
    pub const fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Returns the query embedding.
    #[must_use]
    pub const fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Returns the maximum number of chunks returned.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// A readable chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    /// Matched chunk.
    pub chunk_id: ChunkId,
    /// Chunk it was split from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_chunk_id: Option<ChunkId>,
    /// Chunk text.
    pub content: String,
    /// Flattened chunk metadata.
    pub metadata: Map<String, Value>,
    /// Cosine similarity to the query embedding.
    pub score: f64,
}

impl RankedChunk {
    /// Scores `chunk` against `query`.
    #[must_use]
    pub fn from_chunk(chunk: &DocumentChunk, query: &Embedding) -> Self {
        Self {
            chunk_id: chunk.id().clone(),
            parent_chunk_id: chunk.parent_chunk_id().cloned(),
            content: chunk.content().to_owned(),
            metadata: chunk.metadata().clone(),
            score: chunk.embedding().cosine_similarity(query),
        }
    }
}
