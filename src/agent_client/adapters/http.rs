//! HTTP transport for agent task and metrics endpoints.

use crate::agent_client::{
    domain::{DispatchAck, TaskCreateRequest},
    ports::{AgentTransport, DispatchError, DispatchResult, TokenProvider},
    services::TokenCache,
};
use crate::agent_registry::domain::AgentCard;
use crate::metrics::{
    domain::MetricsReport,
    ports::{MetricsSource, MetricsSourceError},
};
use crate::task::domain::{TaskId, TaskStatusReport};
use async_trait::async_trait;
use mockable::Clock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Agent transport speaking JSON over HTTP.
///
/// Requests to cards declaring bearer authentication carry a token from the
/// cache. A `401 Unauthorized` answer invalidates the cached token and the
/// request is retried once with a freshly issued one.
pub struct HttpAgentTransport<P, C>
where
    P: TokenProvider,
    C: Clock + Send + Sync,
{
    http: Client,
    tokens: TokenCache<P, C>,
}

impl<P, C> HttpAgentTransport<P, C>
where
    P: TokenProvider,
    C: Clock + Send + Sync,
{
    /// Creates a transport with a default HTTP client.
    #[must_use]
    pub fn new(tokens: TokenCache<P, C>) -> Self {
        Self::with_client(Client::new(), tokens)
    }

    /// Creates a transport over a preconfigured HTTP client.
    #[must_use]
    pub const fn with_client(http: Client, tokens: TokenCache<P, C>) -> Self {
        Self { http, tokens }
    }

    async fn send<B>(&self, card: &AgentCard, build: B) -> DispatchResult<Response>
    where
        B: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let audience = card.authentication().audience();
        let response = self.send_once(card, audience, &build).await?;

        let Some(bearer_audience) = audience else {
            return classify(card, response).await;
        };
        if response.status() != StatusCode::UNAUTHORIZED {
            return classify(card, response).await;
        }

        warn!(
            agent_id = %card.agent_id(),
            audience = bearer_audience,
            "agent refused bearer token; refreshing"
        );
        self.tokens.invalidate(bearer_audience).await;
        let retried = self.send_once(card, audience, &build).await?;
        classify(card, retried).await
    }

    async fn send_once<B>(
        &self,
        card: &AgentCard,
        audience: Option<&str>,
        build: &B,
    ) -> DispatchResult<Response>
    where
        B: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut request = build(&self.http);
        if let Some(bearer_audience) = audience {
            let token = self.tokens.token(bearer_audience).await.map_err(|err| {
                DispatchError::Authentication {
                    agent_id: card.agent_id().clone(),
                    message: err.to_string(),
                }
            })?;
            request = request.bearer_auth(token.value());
        }
        request.send().await.map_err(|err| DispatchError::Transport {
            agent_id: card.agent_id().clone(),
            message: err.to_string(),
        })
    }
}

/// Maps HTTP status codes onto the dispatch error taxonomy.
///
/// Client errors are rejections except `408 Request Timeout` and
/// `429 Too Many Requests`, which are transient like server errors.
async fn classify(card: &AgentCard, response: Response) -> DispatchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", body.trim())
    };

    let transient =
        status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS;
    if status.is_client_error() && !transient {
        return Err(DispatchError::Rejected {
            agent_id: card.agent_id().clone(),
            reason: detail,
        });
    }
    Err(DispatchError::Transport {
        agent_id: card.agent_id().clone(),
        message: detail,
    })
}

async fn read_json<T>(card: &AgentCard, response: Response) -> DispatchResult<T>
where
    T: DeserializeOwned,
{
    response
        .json::<T>()
        .await
        .map_err(|err| DispatchError::MalformedResponse {
            agent_id: card.agent_id().clone(),
            message: err.to_string(),
        })
}

#[async_trait]
impl<P, C> AgentTransport for HttpAgentTransport<P, C>
where
    P: TokenProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn dispatch(
        &self,
        card: &AgentCard,
        request: &TaskCreateRequest,
    ) -> DispatchResult<DispatchAck> {
        let url = card.endpoints().task_create_url();
        debug!(agent_id = %card.agent_id(), task_id = %request.task_id, %url, "dispatching task");
        let response = self
            .send(card, |http| http.post(url.as_str()).json(request))
            .await?;

        let body = response
            .bytes()
            .await
            .map_err(|err| DispatchError::Transport {
                agent_id: card.agent_id().clone(),
                message: err.to_string(),
            })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(DispatchAck::accepted());
        }
        serde_json::from_slice(&body).map_err(|err| DispatchError::MalformedResponse {
            agent_id: card.agent_id().clone(),
            message: err.to_string(),
        })
    }

    async fn poll_status(
        &self,
        card: &AgentCard,
        task_id: &TaskId,
    ) -> DispatchResult<TaskStatusReport> {
        let url = card.endpoints().task_status_url(task_id.as_str());
        let response = self.send(card, |http| http.get(url.as_str())).await?;
        read_json(card, response).await
    }

    async fn cancel(&self, card: &AgentCard, task_id: &TaskId) -> DispatchResult<()> {
        let url = card.endpoints().task_cancel_url(task_id.as_str());
        self.send(card, |http| http.post(url.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl<P, C> MetricsSource for HttpAgentTransport<P, C>
where
    P: TokenProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn fetch(&self, card: &AgentCard) -> Result<MetricsReport, MetricsSourceError> {
        let url = card.endpoints().metrics_url(card.agent_id());
        let response = self
            .send(card, |http| http.get(url.as_str()))
            .await
            .map_err(|err| MetricsSourceError::Unreachable {
                agent_id: card.agent_id().clone(),
                message: err.to_string(),
            })?;
        read_json(card, response)
            .await
            .map_err(|err| MetricsSourceError::Malformed {
                agent_id: card.agent_id().clone(),
                message: err.to_string(),
            })
    }
}
