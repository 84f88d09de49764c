//! In-memory vector store with brute-force cosine ranking.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::retrieval::{
    domain::{
        CallerIdentity, ChunkId, CollectionName, DocumentChunk, RankedChunk, RetrievalQuery,
    },
    ports::{DocumentIndex, DocumentRetriever, RetrievalError, RetrievalResult},
};

/// Thread-safe in-memory vector store.
///
/// Collections are created on first insert and fix their embedding
/// dimensions from the first chunk stored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentIndex {
    state: Arc<RwLock<HashMap<CollectionName, Collection>>>,
}

#[derive(Debug, Default)]
struct Collection {
    dimensions: Option<usize>,
    chunks: Vec<DocumentChunk>,
}

impl Collection {
    fn check_dimensions(&self, name: &CollectionName, actual: usize) -> RetrievalResult<()> {
        match self.dimensions {
            Some(expected) if expected != actual => Err(RetrievalError::DimensionMismatch {
                collection: name.clone(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

impl InMemoryDocumentIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> RetrievalError {
    RetrievalError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DocumentRetriever for InMemoryDocumentIndex {
    async fn query(
        &self,
        query: &RetrievalQuery,
        caller: &CallerIdentity,
    ) -> RetrievalResult<Vec<RankedChunk>> {
        let state = self.state.read().map_err(poisoned)?;
        let Some(collection) = state.get(query.collection()) else {
            return Ok(Vec::new());
        };
        collection.check_dimensions(query.collection(), query.embedding().dimensions())?;

        let mut ranked: Vec<RankedChunk> = collection
            .chunks
            .iter()
            .filter(|chunk| caller.can_read(chunk))
            .map(|chunk| RankedChunk::from_chunk(chunk, query.embedding()))
            .collect();
        ranked.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.chunk_id.cmp(&right.chunk_id))
        });
        ranked.truncate(query.limit());
        Ok(ranked)
    }
}

#[async_trait]
impl DocumentIndex for InMemoryDocumentIndex {
    async fn add_chunks(
        &self,
        collection: &CollectionName,
        chunks: Vec<DocumentChunk>,
    ) -> RetrievalResult<()> {
        let Some(first) = chunks.first() else {
            return Ok(());
        };
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state.entry(collection.clone()).or_default();
        let dimensions = stored
            .dimensions
            .unwrap_or_else(|| first.embedding().dimensions());
        for chunk in &chunks {
            if chunk.embedding().dimensions() != dimensions {
                return Err(RetrievalError::DimensionMismatch {
                    collection: collection.clone(),
                    expected: dimensions,
                    actual: chunk.embedding().dimensions(),
                });
            }
        }
        stored.dimensions = Some(dimensions);

        for chunk in chunks {
            match stored
                .chunks
                .iter_mut()
                .find(|existing| existing.id() == chunk.id())
            {
                Some(existing) => *existing = chunk,
                None => stored.chunks.push(chunk),
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &CollectionName, ids: &[ChunkId]) -> RetrievalResult<usize> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .get_mut(collection)
            .ok_or_else(|| RetrievalError::UnknownCollection(collection.clone()))?;
        let before = stored.chunks.len();
        stored.chunks.retain(|chunk| !ids.contains(chunk.id()));
        Ok(before.saturating_sub(stored.chunks.len()))
    }

    async fn clear(&self, collection: &CollectionName) -> RetrievalResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .get_mut(collection)
            .ok_or_else(|| RetrievalError::UnknownCollection(collection.clone()))?;
        stored.chunks.clear();
        stored.dimensions = None;
        Ok(())
    }

    async fn count(&self, collection: &CollectionName) -> RetrievalResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .get(collection)
            .map_or(0, |stored| stored.chunks.len()))
    }

    async fn latest(&self, collection: &CollectionName) -> RetrievalResult<Option<DocumentChunk>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .get(collection)
            .and_then(|stored| stored.chunks.last().cloned()))
    }
}
