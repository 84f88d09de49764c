//! Error types for retrieval domain validation.

use thiserror::Error;

/// Errors returned while constructing retrieval values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalDomainError {
    /// The chunk identifier is empty after trimming.
    #[error("chunk id must not be empty")]
    EmptyChunkId,

    /// The collection name is empty after trimming.
    #[error("collection name must not be empty")]
    EmptyCollectionName,

    /// The collection name contains characters outside `[a-z0-9_]`.
    #[error("collection name '{0}' may only contain lowercase letters, digits, and underscores")]
    InvalidCollectionName(String),

    /// An embedding has no dimensions.
    #[error("embedding must not be empty")]
    EmptyEmbedding,

    /// An embedding component is NaN or infinite.
    #[error("embedding component {index} is not finite")]
    NonFiniteEmbedding {
        /// Position of the offending component.
        index: usize,
    },

    /// A query asked for no results.
    #[error("result limit must be at least 1")]
    ZeroLimit,
}
