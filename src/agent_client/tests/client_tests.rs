//! Tests for the timeout-bounded client and the token cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::agent_client::{
    adapters::memory::{AgentBehaviour, InMemoryAgentTransport, StaticTokenProvider},
    domain::{BearerToken, DispatchAck, TaskCreateRequest},
    ports::{DispatchError, TokenError, TokenProvider},
    services::{AgentClient, TokenCache},
};
use crate::agent_registry::tests::fixtures::{agent_id, capability_id, card};
use crate::task::domain::{NewTask, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn transport() -> Arc<InMemoryAgentTransport> {
    Arc::new(InMemoryAgentTransport::new())
}

fn stored_task(raw: &str) -> Task {
    let new_task = NewTask::new(
        TaskId::new(raw).expect("valid task id"),
        capability_id("retrieve-from-documents"),
        json!({"query": "renewable energy outlook"}),
    );
    Task::new(new_task, &DefaultClock)
}

#[rstest]
fn create_request_carries_task_fields() {
    let parent = TaskId::new("task-root").expect("valid task id");
    let new_task = NewTask::new(
        TaskId::new("task-root-research-0").expect("valid task id"),
        capability_id("retrieve-from-documents"),
        json!({"query": "solar"}),
    )
    .with_parent(parent);
    let task = Task::new(new_task, &DefaultClock);

    let body = serde_json::to_value(TaskCreateRequest::for_task(&task)).expect("serialises");

    assert_eq!(
        body,
        json!({
            "task_id": "task-root-research-0",
            "parent_task_id": "task-root",
            "agent_capability": "retrieve-from-documents",
            "payload": {"query": "solar"},
        })
    );
}

#[rstest]
fn root_request_omits_parent() {
    let body = serde_json::to_value(TaskCreateRequest::for_task(&stored_task("task-abc123")))
        .expect("serialises");
    assert!(body.get("parent_task_id").is_none());
}

#[rstest]
fn refusal_ack_parses_reason() {
    let ack: DispatchAck = serde_json::from_str(r#"{"accepted": false, "reason": "at capacity"}"#)
        .expect("valid ack");
    assert_eq!(ack, DispatchAck::refused("at capacity"));
}

#[rstest]
fn token_debug_output_redacts_value() {
    let token = BearerToken::new("s3cr3t", None);
    assert!(!format!("{token:?}").contains("s3cr3t"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_dispatch_is_recorded(transport: Arc<InMemoryAgentTransport>) {
    let client = AgentClient::new(Arc::clone(&transport), Duration::from_secs(1));
    let researcher = card("researcher-1", &["retrieve-from-documents"]);
    let task = stored_task("task-abc123");

    client
        .dispatch(&researcher, &task)
        .await
        .expect("dispatch should succeed");

    assert_eq!(
        transport.attempts_for(task.id()),
        vec![agent_id("researcher-1")]
    );
    let report = client
        .poll_status(&researcher, task.id())
        .await
        .expect("status should be available");
    assert_eq!(report.status, TaskStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_dispatch_is_rejected_and_not_retryable(transport: Arc<InMemoryAgentTransport>) {
    let researcher = card("researcher-1", &["retrieve-from-documents"]);
    transport.set_behaviour(
        researcher.agent_id(),
        AgentBehaviour::Refuse("at capacity".to_owned()),
    );
    let client = AgentClient::new(transport, Duration::from_secs(1));

    let result = client
        .dispatch(&researcher, &stored_task("task-abc123"))
        .await;

    let err = result.expect_err("dispatch should be refused");
    assert_eq!(
        err,
        DispatchError::Rejected {
            agent_id: agent_id("researcher-1"),
            reason: "at capacity".to_owned(),
        }
    );
    assert!(!err.is_retryable());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_agent_is_retryable(transport: Arc<InMemoryAgentTransport>) {
    let researcher = card("researcher-1", &["retrieve-from-documents"]);
    transport.set_behaviour(researcher.agent_id(), AgentBehaviour::Unavailable);
    let client = AgentClient::new(transport, Duration::from_secs(1));

    let err = client
        .dispatch(&researcher, &stored_task("task-abc123"))
        .await
        .expect_err("dispatch should fail");

    assert!(matches!(err, DispatchError::Transport { .. }));
    assert!(err.is_retryable());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unresponsive_agent_times_out(transport: Arc<InMemoryAgentTransport>) {
    let researcher = card("researcher-1", &["retrieve-from-documents"]);
    transport.set_behaviour(researcher.agent_id(), AgentBehaviour::Unresponsive);
    let client = AgentClient::new(transport, Duration::from_millis(250));

    let err = client
        .dispatch(&researcher, &stored_task("task-abc123"))
        .await
        .expect_err("dispatch should time out");

    assert_eq!(
        err,
        DispatchError::Timeout {
            agent_id: agent_id("researcher-1"),
            timeout_ms: 250,
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_reaches_the_agent(transport: Arc<InMemoryAgentTransport>) {
    let researcher = card("researcher-1", &["retrieve-from-documents"]);
    let client = AgentClient::new(Arc::clone(&transport), Duration::from_secs(1));
    let task_id = TaskId::new("task-abc123").expect("valid task id");

    client
        .cancel(&researcher, &task_id)
        .await
        .expect("cancel should be delivered");

    assert_eq!(
        transport.cancellations(),
        vec![(agent_id("researcher-1"), task_id)]
    );
}

/// Provider counting issuances and handing out tokens with a fixed lifetime.
struct CountingProvider {
    issued: AtomicU32,
    lifetime: TimeDelta,
}

#[async_trait]
impl TokenProvider for CountingProvider {
    async fn issue(&self, audience: &str) -> Result<BearerToken, TokenError> {
        let count = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(BearerToken::new(
            format!("{audience}-{count}"),
            Some(Utc::now() + self.lifetime),
        ))
    }
}

fn counting_cache(
    lifetime: TimeDelta,
) -> (
    Arc<CountingProvider>,
    TokenCache<CountingProvider, DefaultClock>,
) {
    let provider = Arc::new(CountingProvider {
        issued: AtomicU32::new(0),
        lifetime,
    });
    let cache = TokenCache::new(Arc::clone(&provider), Arc::new(DefaultClock));
    (provider, cache)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_token_is_reused() {
    let (provider, cache) = counting_cache(TimeDelta::hours(1));

    let first = cache.token("agents.internal").await.expect("token issued");
    let second = cache.token("agents.internal").await.expect("token cached");

    assert_eq!(first, second);
    assert_eq!(provider.issued.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_token_is_reissued() {
    let (provider, cache) = counting_cache(TimeDelta::seconds(-1));

    let first = cache.token("agents.internal").await.expect("token issued");
    let second = cache.token("agents.internal").await.expect("token reissued");

    assert_ne!(first.value(), second.value());
    assert_eq!(provider.issued.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalidated_token_is_reissued() {
    let (provider, cache) = counting_cache(TimeDelta::hours(1));

    cache.token("agents.internal").await.expect("token issued");
    cache.invalidate("agents.internal").await;
    cache.token("agents.internal").await.expect("token reissued");

    assert_eq!(provider.issued.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn static_provider_rejects_unknown_audience() {
    let provider = StaticTokenProvider::new().with_token("agents.internal", "tok");
    let result = provider.issue("billing.internal").await;
    assert_eq!(
        result,
        Err(TokenError::UnknownAudience("billing.internal".to_owned()))
    );
}
