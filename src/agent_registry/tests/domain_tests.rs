//! Unit tests for Agent Card domain types.

use super::fixtures::{agent_id, capability_id, card};
use crate::agent_registry::domain::{
    AgentCard, AgentEndpoints, AgentId, AuthScheme, Capability, CapabilityId, OperatingMetadata,
    RegistryDomainError, SchemaDescriptor, SchemaKind, SchemaMismatch,
};
use rstest::rstest;
use serde_json::json;

// ── Identifier validation ──────────────────────────────────────────

#[rstest]
#[case("researcher-1")]
#[case("planner.eu_west")]
#[case("A")]
fn valid_agent_ids_are_accepted(#[case] input: &str) {
    let id = AgentId::new(input).expect("valid agent id");
    assert_eq!(id.as_str(), input);
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_agent_id_is_rejected(#[case] input: &str) {
    assert_eq!(AgentId::new(input), Err(RegistryDomainError::EmptyAgentId));
}

#[rstest]
#[case("agent one")]
#[case("agent/one")]
fn agent_id_with_invalid_characters_is_rejected(#[case] input: &str) {
    assert!(matches!(
        AgentId::new(input),
        Err(RegistryDomainError::InvalidAgentId(_))
    ));
}

#[rstest]
fn overlong_agent_id_is_rejected() {
    let result = AgentId::new("a".repeat(129));
    assert!(matches!(
        result,
        Err(RegistryDomainError::IdentifierTooLong { limit: 128, .. })
    ));
}

#[rstest]
fn capability_id_is_trimmed_and_lowercased() {
    let id = CapabilityId::new("  Retrieve-From-Documents ").expect("valid capability id");
    assert_eq!(id.as_str(), "retrieve-from-documents");
}

#[rstest]
#[case("retrieve documents")]
#[case("retrieve:documents")]
fn capability_id_with_invalid_characters_is_rejected(#[case] input: &str) {
    assert!(matches!(
        CapabilityId::new(input),
        Err(RegistryDomainError::InvalidCapabilityId(_))
    ));
}

// ── Schema descriptors ─────────────────────────────────────────────

#[rstest]
fn any_schema_admits_every_payload() {
    let schema = SchemaDescriptor::any();
    for payload in [json!(null), json!(1), json!("q"), json!([1]), json!({})] {
        assert_eq!(schema.check(&payload), Ok(()));
    }
}

#[rstest]
#[case(json!({"query": "x"}), Ok(()))]
#[case(json!({"other": 1}), Err(SchemaMismatch::MissingField("query".to_owned())))]
#[case(
    json!("query"),
    Err(SchemaMismatch::KindMismatch { expected: SchemaKind::Object, found: SchemaKind::String })
)]
fn object_schema_checks_kind_and_required_fields(
    #[case] payload: serde_json::Value,
    #[case] expected: Result<(), SchemaMismatch>,
) {
    let schema = SchemaDescriptor::object(["query"]);
    assert_eq!(schema.check(&payload), expected);
}

#[rstest]
fn schema_deserialises_from_type_keyword_and_ignores_properties() {
    let schema: SchemaDescriptor = serde_json::from_value(json!({
        "type": "object",
        "required": ["query"],
        "properties": {"query": {"type": "string"}}
    }))
    .expect("descriptor should parse");
    assert_eq!(schema.kind(), SchemaKind::Object);
    assert!(schema.required().contains("query"));
}

// ── Endpoints ──────────────────────────────────────────────────────

#[rstest]
fn endpoints_resolve_urls_from_templates() {
    let endpoints = AgentEndpoints::new(
        "https://researcher.example/",
        "/v1/tasks",
        "/v1/tasks/{task_id}",
    )
    .expect("valid endpoints");

    assert_eq!(endpoints.task_create_url(), "https://researcher.example/v1/tasks");
    assert_eq!(
        endpoints.task_status_url("task-abc123"),
        "https://researcher.example/v1/tasks/task-abc123"
    );
    assert_eq!(
        endpoints.task_cancel_url("task-abc123"),
        "https://researcher.example/v1/tasks/task-abc123/cancel"
    );
    assert_eq!(
        endpoints.metrics_url(&agent_id("researcher-1")),
        "https://researcher.example/v1/agents/researcher-1/metrics"
    );
}

#[rstest]
fn absolute_templates_are_used_verbatim() {
    let endpoints = AgentEndpoints::new(
        "http://gateway.local",
        "http://ingest.local/tasks",
        "http://status.local/tasks/{task_id}",
    )
    .expect("valid endpoints");
    assert_eq!(endpoints.task_create_url(), "http://ingest.local/tasks");
    assert_eq!(
        endpoints.task_status_url("t1"),
        "http://status.local/tasks/t1"
    );
}

#[rstest]
#[case("", RegistryDomainError::EmptyBaseUrl)]
#[case("ftp://agent", RegistryDomainError::InvalidBaseUrl("ftp://agent".to_owned()))]
fn unusable_base_url_is_rejected(#[case] base_url: &str, #[case] expected: RegistryDomainError) {
    let result = AgentEndpoints::new(base_url, "/tasks", "/tasks/{task_id}");
    assert_eq!(result, Err(expected));
}

#[rstest]
fn status_template_without_placeholder_is_rejected() {
    let result = AgentEndpoints::new("http://agent", "/tasks", "/tasks/status");
    assert!(matches!(
        result,
        Err(RegistryDomainError::MissingPlaceholder { ref placeholder, .. })
            if placeholder == "{task_id}"
    ));
}

#[rstest]
fn metrics_template_without_placeholder_is_rejected() {
    let result = AgentEndpoints::new("http://agent", "/tasks", "/tasks/{task_id}")
        .and_then(|endpoints| endpoints.with_metrics("/metrics"));
    assert!(matches!(
        result,
        Err(RegistryDomainError::MissingPlaceholder { .. })
    ));
}

// ── Cards ──────────────────────────────────────────────────────────

#[rstest]
fn card_without_capabilities_is_rejected() {
    let endpoints =
        AgentEndpoints::new("http://agent", "/tasks", "/tasks/{task_id}").expect("endpoints");
    let metadata = OperatingMetadata::new("ollama", 2, 1_000).expect("metadata");
    let result = AgentCard::new(agent_id("empty"), Vec::new(), endpoints, metadata);
    assert_eq!(
        result,
        Err(RegistryDomainError::NoCapabilities(agent_id("empty")))
    );
}

#[rstest]
fn card_with_duplicate_capabilities_is_rejected() {
    let endpoints =
        AgentEndpoints::new("http://agent", "/tasks", "/tasks/{task_id}").expect("endpoints");
    let metadata = OperatingMetadata::new("ollama", 2, 1_000).expect("metadata");
    let capabilities = vec![
        Capability::new(capability_id("synthesize-answer")),
        Capability::new(capability_id("synthesize-answer")),
    ];
    let result = AgentCard::new(agent_id("dup"), capabilities, endpoints, metadata);
    assert!(matches!(
        result,
        Err(RegistryDomainError::DuplicateCapability { .. })
    ));
}

#[rstest]
#[case("", 1, RegistryDomainError::EmptyBackend)]
#[case("ollama", 0, RegistryDomainError::ZeroConcurrencyLimit)]
fn invalid_metadata_is_rejected(
    #[case] backend: &str,
    #[case] limit: u32,
    #[case] expected: RegistryDomainError,
) {
    assert_eq!(OperatingMetadata::new(backend, limit, 0), Err(expected));
}

#[rstest]
fn card_document_parses_with_defaults() {
    let document = json!({
        "agent_id": "researcher-1",
        "capabilities": [
            {"id": "retrieve-from-documents", "input_schema": {"type": "object", "required": ["query"]}}
        ],
        "endpoints": {
            "base_url": "http://researcher-1:8080",
            "task_create": "/v1/tasks",
            "task_status": "/v1/tasks/{task_id}"
        },
        "metadata": {"backend": "ollama", "concurrency_limit": 4, "response_time_sla_ms": 3000}
    });

    let parsed = AgentCard::from_json(&document.to_string()).expect("card should parse");

    assert_eq!(parsed.agent_id().as_str(), "researcher-1");
    assert_eq!(parsed.authentication(), &AuthScheme::None);
    assert_eq!(parsed.endpoints().metrics(), "/v1/agents/{agent_id}/metrics");
    let capability = parsed
        .capability(&capability_id("retrieve-from-documents"))
        .expect("declared capability");
    assert_eq!(capability.input_schema().kind(), SchemaKind::Object);
    assert_eq!(capability.output_schema(), &SchemaDescriptor::any());
}

#[rstest]
#[case(json!({"agent_id": "a", "capabilities": [], "endpoints": {"base_url": "http://a", "task_create": "/t", "task_status": "/t/{task_id}"}, "metadata": {"backend": "b", "concurrency_limit": 1, "response_time_sla_ms": 1}}))]
#[case(json!({"agent_id": "a", "capabilities": [{"id": "x"}], "endpoints": {"base_url": "a", "task_create": "/t", "task_status": "/t/{task_id}"}, "metadata": {"backend": "b", "concurrency_limit": 1, "response_time_sla_ms": 1}}))]
#[case(json!({"agent_id": "a", "capabilities": [{"id": "x"}], "endpoints": {"base_url": "http://a", "task_create": "/t", "task_status": "/t/{task_id}"}, "authentication": {"scheme": "bearer", "audience": " "}, "metadata": {"backend": "b", "concurrency_limit": 1, "response_time_sla_ms": 1}}))]
#[case(json!({"agent_id": "a b", "capabilities": [{"id": "x"}]}))]
fn malformed_card_documents_are_rejected(#[case] document: serde_json::Value) {
    assert!(AgentCard::from_json(&document.to_string()).is_err());
}

#[rstest]
fn bearer_audience_is_exposed() {
    let scheme = AuthScheme::bearer(" researchers ").expect("valid audience");
    assert_eq!(scheme.audience(), Some("researchers"));
    assert_eq!(AuthScheme::None.audience(), None);
    assert_eq!(AuthScheme::bearer("  "), Err(RegistryDomainError::EmptyAudience));
}

#[rstest]
fn card_reports_offered_capabilities() {
    let research = card("researcher-1", &["retrieve-from-documents"]);
    assert!(research.offers(&capability_id("retrieve-from-documents")));
    assert!(!research.offers(&capability_id("synthesize-answer")));
}
