//! Vector-store ports.

use crate::retrieval::domain::{
    CallerIdentity, ChunkId, CollectionName, DocumentChunk, RankedChunk, RetrievalQuery,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for vector-store operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Read side of a vector store.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Returns the chunks most similar to the query that `caller` may read,
    /// best first.
    ///
    /// Access is checked before ranking, so unreadable chunks never displace
    /// readable ones. An unknown collection yields no chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::DimensionMismatch`] when the query embedding
    /// does not match the collection.
    async fn query(
        &self,
        query: &RetrievalQuery,
        caller: &CallerIdentity,
    ) -> RetrievalResult<Vec<RankedChunk>>;
}

/// Write side of a vector store, fed by the ingestion pipeline.
#[async_trait]
pub trait DocumentIndex: DocumentRetriever {
    /// Adds chunks to a collection, replacing chunks with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::DimensionMismatch`] when a chunk's embedding
    /// differs in size from the collection's.
    async fn add_chunks(
        &self,
        collection: &CollectionName,
        chunks: Vec<DocumentChunk>,
    ) -> RetrievalResult<()>;

    /// Removes chunks by id and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::UnknownCollection`] when the collection does
    /// not exist.
    async fn delete(&self, collection: &CollectionName, ids: &[ChunkId]) -> RetrievalResult<usize>;

    /// Removes every chunk in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::UnknownCollection`] when the collection does
    /// not exist.
    async fn clear(&self, collection: &CollectionName) -> RetrievalResult<()>;

    /// Returns the number of chunks in a collection; zero when unknown.
    async fn count(&self, collection: &CollectionName) -> RetrievalResult<usize>;

    /// Returns the most recently added chunk of a collection.
    async fn latest(&self, collection: &CollectionName) -> RetrievalResult<Option<DocumentChunk>>;
}

/// Errors returned by vector-store implementations.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// The collection does not exist.
    #[error("unknown collection: {0}")]
    UnknownCollection(CollectionName),

    /// An embedding does not match the collection's dimensions.
    #[error("collection {collection} holds {expected}-dimensional embeddings, got {actual}")]
    DimensionMismatch {
        /// Collection addressed.
        collection: CollectionName,
        /// Dimensions of stored embeddings.
        expected: usize,
        /// Dimensions supplied.
        actual: usize,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RetrievalError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
