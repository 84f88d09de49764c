//! Token provider backed by configured static tokens.

use crate::agent_client::{
    domain::BearerToken,
    ports::{TokenError, TokenProvider},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Issues non-expiring tokens from a fixed audience table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenProvider {
    /// Creates a provider with no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the token for an audience.
    #[must_use]
    pub fn with_token(mut self, audience: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(audience.into(), token.into());
        self
    }
}

impl<S> FromIterator<(S, S)> for StaticTokenProvider
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        Self {
            tokens: iter
                .into_iter()
                .map(|(audience, token)| (audience.into(), token.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn issue(&self, audience: &str) -> Result<BearerToken, TokenError> {
        self.tokens
            .get(audience)
            .map(|token| BearerToken::new(token.as_str(), None))
            .ok_or_else(|| TokenError::UnknownAudience(audience.to_owned()))
    }
}
