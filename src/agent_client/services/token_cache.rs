//! Per-audience bearer token cache.

use crate::agent_client::{
    domain::BearerToken,
    ports::{TokenError, TokenProvider},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Caches tokens per audience and refreshes them on expiry.
///
/// The lock is held while a token is issued so that concurrent requests for
/// one audience share a single issuance.
pub struct TokenCache<P, C>
where
    P: TokenProvider,
    C: Clock + Send + Sync,
{
    provider: Arc<P>,
    clock: Arc<C>,
    tokens: Arc<Mutex<HashMap<String, BearerToken>>>,
}

impl<P, C> Clone for TokenCache<P, C>
where
    P: TokenProvider,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            clock: Arc::clone(&self.clock),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<P, C> TokenCache<P, C>
where
    P: TokenProvider,
    C: Clock + Send + Sync,
{
    /// Creates an empty cache over `provider`.
    #[must_use]
    pub fn new(provider: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            provider,
            clock,
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns a fresh token for `audience`, issuing one when the cached
    /// token is missing or expired.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when the provider cannot issue a token.
    pub async fn token(&self, audience: &str) -> Result<BearerToken, TokenError> {
        let mut tokens = self.tokens.lock().await;
        let now = self.clock.utc();
        if let Some(cached) = tokens.get(audience)
            && cached.is_fresh_at(now)
        {
            return Ok(cached.clone());
        }

        debug!(audience, "issuing bearer token");
        let issued = self.provider.issue(audience).await?;
        tokens.insert(audience.to_owned(), issued.clone());
        Ok(issued)
    }

    /// Drops the cached token for `audience` so the next request re-issues.
    pub async fn invalidate(&self, audience: &str) {
        self.tokens.lock().await.remove(audience);
    }
}
