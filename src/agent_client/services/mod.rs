//! Agent client services: bounded requests, token caching, and status
//! subscriptions.

mod client;
mod subscription;
mod token_cache;

pub use client::AgentClient;
pub use subscription::{PollSettings, StatusSubscription};
pub use token_cache::TokenCache;
