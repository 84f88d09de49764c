//! In-memory vector store for tests and local runs.

mod index;

pub use index::InMemoryDocumentIndex;
