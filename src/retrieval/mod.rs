//! Vector-store query contract with access trimming at query time.
//!
//! Researcher agents answer plan steps from document chunks stored in named
//! collections. Chunks are produced by an external hierarchical chunker and
//! keep a link to their parent chunk. Every query carries the caller's
//! identity and only chunks the caller may read are ranked.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::DocumentChunk`], [`domain::RetrievalQuery`],
//!   [`domain::CallerIdentity`], [`domain::RankedChunk`]
//! - **Ports**: [`ports::DocumentRetriever`], [`ports::DocumentIndex`]
//! - **Adapters**: [`adapters::memory::InMemoryDocumentIndex`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
