//! Port contracts for querying and maintaining document collections.

mod retriever;

pub use retriever::{DocumentIndex, DocumentRetriever, RetrievalError, RetrievalResult};
