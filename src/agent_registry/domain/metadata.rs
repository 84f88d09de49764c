//! Operating metadata declared by Agent Cards.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operational facts an agent declares about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingMetadata {
    backend: String,
    concurrency_limit: u32,
    response_time_sla_ms: u64,
}

impl OperatingMetadata {
    /// Creates validated operating metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyBackend`] when the backend is blank
    /// or [`RegistryDomainError::ZeroConcurrencyLimit`] when the limit is
    /// zero.
    pub fn new(
        backend: impl Into<String>,
        concurrency_limit: u32,
        response_time_sla_ms: u64,
    ) -> Result<Self, RegistryDomainError> {
        let normalized = backend.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyBackend);
        }
        if concurrency_limit == 0 {
            return Err(RegistryDomainError::ZeroConcurrencyLimit);
        }
        Ok(Self {
            backend: normalized,
            concurrency_limit,
            response_time_sla_ms,
        })
    }

    /// Returns the backend identifier (for example the model host).
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Returns the number of tasks the agent accepts concurrently.
    #[must_use]
    pub const fn concurrency_limit(&self) -> u32 {
        self.concurrency_limit
    }

    /// Returns the declared response-time SLA in milliseconds.
    #[must_use]
    pub const fn response_time_sla_ms(&self) -> u64 {
        self.response_time_sla_ms
    }

    /// Returns the declared response-time SLA.
    #[must_use]
    pub const fn response_time_sla(&self) -> Duration {
        Duration::from_millis(self.response_time_sla_ms)
    }
}
