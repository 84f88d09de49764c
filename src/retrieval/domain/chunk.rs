//! Stored document chunks and their embeddings.

use super::{ChunkId, RetrievalDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Dense embedding vector with finite components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Creates a validated embedding.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalDomainError::EmptyEmbedding`] for a zero-length
    /// vector or [`RetrievalDomainError::NonFiniteEmbedding`] when a component
    /// is NaN or infinite.
    pub fn new(components: Vec<f32>) -> Result<Self, RetrievalDomainError> {
        if components.is_empty() {
            return Err(RetrievalDomainError::EmptyEmbedding);
        }
        if let Some(index) = components.iter().position(|value| !value.is_finite()) {
            return Err(RetrievalDomainError::NonFiniteEmbedding { index });
        }
        Ok(Self(components))
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Returns the components.
    #[must_use]
    pub fn components(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity in `-1.0..=1.0`; zero when either vector has no
    /// magnitude.
    ///
    /// Vectors of different dimensions are compared over their common
    /// prefix; callers check dimensions first.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "cosine similarity is defined over floating-point vectors"
    )]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let (dot, left_norm, right_norm) = self.0.iter().zip(&other.0).fold(
            (0.0_f64, 0.0_f64, 0.0_f64),
            |(dot, left_norm, right_norm), (left, right)| {
                let x = f64::from(*left);
                let y = f64::from(*right);
                (dot + x * y, left_norm + x * x, right_norm + y * y)
            },
        );
        let magnitude = left_norm.sqrt() * right_norm.sqrt();
        if magnitude > 0.0 { dot / magnitude } else { 0.0 }
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = RetrievalDomainError;

    fn try_from(value: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(value: Embedding) -> Self {
        value.0
    }
}

/// One chunk as produced by the hierarchical chunker.
///
/// A chunk with no access groups is readable by every caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: ChunkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_chunk_id: Option<ChunkId>,
    content: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    embedding: Embedding,
    #[serde(default)]
    access_groups: BTreeSet<String>,
}

impl DocumentChunk {
    /// Creates a public chunk without metadata.
    #[must_use]
    pub fn new(id: ChunkId, content: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            id,
            parent_chunk_id: None,
            content: content.into(),
            metadata: Map::new(),
            embedding,
            access_groups: BTreeSet::new(),
        }
    }

    /// Links the chunk to the chunk it was split from.
    #[must_use]
    pub fn with_parent(mut self, parent_chunk_id: ChunkId) -> Self {
        self.parent_chunk_id = Some(parent_chunk_id);
        self
    }

    /// Sets the chunk metadata, flattening values to scalars.
    ///
    /// Nulls become empty strings; arrays and objects are stored as their
    /// JSON text.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata
            .into_iter()
            .map(|(key, value)| (key, flatten(value)))
            .collect();
        self
    }

    /// Restricts the chunk to callers in at least one of `groups`.
    #[must_use]
    pub fn restricted_to<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the chunk identifier.
    #[must_use]
    pub const fn id(&self) -> &ChunkId {
        &self.id
    }

    /// Returns the parent chunk, for chunks split from a larger one.
    #[must_use]
    pub const fn parent_chunk_id(&self) -> Option<&ChunkId> {
        self.parent_chunk_id.as_ref()
    }

    /// Returns the chunk text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the flattened metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the embedding.
    #[must_use]
    pub const fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Returns the groups allowed to read the chunk.
    #[must_use]
    pub const fn access_groups(&self) -> &BTreeSet<String> {
        &self.access_groups
    }
}

fn flatten(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}
