//! In-memory adapters for Agent Card storage.

mod card_repository;

pub use card_repository::InMemoryAgentCardRepository;
