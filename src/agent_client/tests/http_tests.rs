//! Tests for the HTTP agent transport against a mock agent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::agent_client::{
    adapters::{HttpAgentTransport, memory::StaticTokenProvider},
    domain::{BearerToken, DispatchAck, TaskCreateRequest},
    ports::{AgentTransport, DispatchError, TokenError, TokenProvider},
    services::TokenCache,
};
use crate::agent_registry::{
    domain::{AgentCard, AuthScheme},
    tests::fixtures::{agent_id, capability_id, card_at},
};
use crate::metrics::{
    domain::QueueDepth,
    ports::{MetricsSource, MetricsSourceError},
};
use crate::task::domain::{Progress, TaskId, TaskStatus};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUDIENCE: &str = "agents.internal";

fn static_transport() -> HttpAgentTransport<StaticTokenProvider, DefaultClock> {
    let provider = StaticTokenProvider::new().with_token(AUDIENCE, "tok-static");
    HttpAgentTransport::new(TokenCache::new(Arc::new(provider), Arc::new(DefaultClock)))
}

fn researcher(server: &MockServer) -> AgentCard {
    card_at("researcher-1", &server.uri(), &["retrieve-from-documents"])
}

fn secured(card: AgentCard) -> AgentCard {
    card.with_authentication(AuthScheme::bearer(AUDIENCE).expect("valid audience"))
        .expect("valid authentication")
}

fn request() -> TaskCreateRequest {
    TaskCreateRequest {
        task_id: TaskId::new("task-abc123").expect("valid task id"),
        parent_task_id: None,
        agent_capability: capability_id("retrieve-from-documents"),
        payload: json!({"query": "renewable energy outlook"}),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dispatch_posts_request_and_reads_ack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .and(body_json(json!({
            "task_id": "task-abc123",
            "agent_capability": "retrieve-from-documents",
            "payload": {"query": "renewable energy outlook"},
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"accepted": true})))
        .expect(1)
        .mount(&server)
        .await;

    let ack = static_transport()
        .dispatch(&researcher(&server), &request())
        .await
        .expect("dispatch should succeed");

    assert_eq!(ack, DispatchAck::accepted());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_success_body_counts_as_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ack = static_transport()
        .dispatch(&researcher(&server), &request())
        .await
        .expect("dispatch should succeed");

    assert!(ack.accepted);
}

#[rstest]
#[case(400, true)]
#[case(404, true)]
#[case(408, false)]
#[case(429, false)]
#[case(500, false)]
#[case(503, false)]
#[tokio::test(flavor = "multi_thread")]
async fn error_statuses_are_classified(#[case] status: u16, #[case] rejected: bool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = static_transport()
        .dispatch(&researcher(&server), &request())
        .await
        .expect_err("dispatch should fail");

    assert_eq!(matches!(err, DispatchError::Rejected { .. }), rejected);
    assert_eq!(err.is_retryable(), !rejected);
    assert_eq!(err.agent_id(), &agent_id("researcher-1"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_agent_is_a_transport_failure() {
    let card = card_at(
        "researcher-1",
        "http://127.0.0.1:9",
        &["retrieve-from-documents"],
    );

    let err = static_transport()
        .dispatch(&card, &request())
        .await
        .expect_err("dispatch should fail");

    assert!(matches!(err, DispatchError::Transport { .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poll_reads_status_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/task-abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "progress": 0.4,
        })))
        .mount(&server)
        .await;

    let report = static_transport()
        .poll_status(&researcher(&server), &request().task_id)
        .await
        .expect("poll should succeed");

    assert_eq!(report.status, TaskStatus::Running);
    assert_eq!(
        report.progress,
        Progress::new(0.4).expect("valid progress")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undecodable_status_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/task-abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = static_transport()
        .poll_status(&researcher(&server), &request().task_id)
        .await
        .expect_err("poll should fail");

    assert!(matches!(err, DispatchError::MalformedResponse { .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_posts_to_cancel_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks/task-abc123/cancel"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    static_transport()
        .cancel(&researcher(&server), &request().task_id)
        .await
        .expect("cancel should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn secured_agent_receives_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .and(header("authorization", "Bearer tok-static"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    static_transport()
        .dispatch(&secured(researcher(&server)), &request())
        .await
        .expect("dispatch should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_credential_is_an_authentication_failure() {
    let server = MockServer::start().await;
    let transport = HttpAgentTransport::new(TokenCache::new(
        Arc::new(StaticTokenProvider::new()),
        Arc::new(DefaultClock),
    ));

    let err = transport
        .dispatch(&secured(researcher(&server)), &request())
        .await
        .expect_err("dispatch should fail");

    assert!(matches!(err, DispatchError::Authentication { .. }));
}

/// Provider handing out a new token on every issuance.
#[derive(Default)]
struct RotatingProvider {
    issued: AtomicU32,
}

#[async_trait]
impl TokenProvider for RotatingProvider {
    async fn issue(&self, _audience: &str) -> Result<BearerToken, TokenError> {
        let count = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(BearerToken::new(format!("tok-{count}"), None))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_token_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    let provider = Arc::new(RotatingProvider::default());
    let transport = HttpAgentTransport::new(TokenCache::new(
        Arc::clone(&provider),
        Arc::new(DefaultClock),
    ));

    transport
        .dispatch(&secured(researcher(&server)), &request())
        .await
        .expect("dispatch should succeed after refresh");

    assert_eq!(provider.issued.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_unauthorised_answer_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tasks"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = static_transport()
        .dispatch(&secured(researcher(&server)), &request())
        .await
        .expect_err("dispatch should fail");

    assert!(matches!(err, DispatchError::Rejected { .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_are_fetched_from_the_default_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/agents/researcher-1/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks_total": 40,
            "tasks_completed": 36,
            "tasks_failed": 2,
            "tasks_running": 2,
            "avg_response_time_ms": 850,
            "p95_response_time_ms": 1900,
            "queue_depth": 15,
        })))
        .mount(&server)
        .await;

    let report = static_transport()
        .fetch(&researcher(&server))
        .await
        .expect("metrics should be fetched");

    assert_eq!(report.tasks_total, 40);
    assert_eq!(report.queue_depth, QueueDepth::Known(15));
    assert_eq!(report.last_error, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_metrics_endpoint_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/agents/researcher-1/metrics"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = static_transport()
        .fetch(&researcher(&server))
        .await
        .expect_err("metrics should fail");

    assert!(matches!(err, MetricsSourceError::Unreachable { .. }));
}
