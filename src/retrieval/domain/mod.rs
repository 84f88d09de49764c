//! Domain model for document chunks and similarity queries.

mod chunk;
mod error;
mod ids;
mod query;

pub use chunk::{DocumentChunk, Embedding};
pub use error::RetrievalDomainError;
pub use ids::{ChunkId, CollectionName};
pub use query::{CallerIdentity, DEFAULT_RESULT_LIMIT, RankedChunk, RetrievalQuery};
