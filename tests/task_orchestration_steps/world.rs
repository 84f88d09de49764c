//! Shared world state for task orchestration BDD scenarios.

use std::sync::Arc;

use gropius::agent_client::{adapters::memory::InMemoryAgentTransport, services::AgentClient};
use gropius::agent_registry::{
    adapters::memory::InMemoryAgentCardRepository,
    domain::{AgentCard, AgentId, RegistrationOutcome},
    services::AgentRegistryService,
};
use gropius::config::EngineConfig;
use gropius::engine::Engine;
use gropius::metrics::{adapters::memory::InMemoryMetricsSource, services::MetricsCollector};
use gropius::orchestrator::services::{Orchestrator, OrchestratorError};
use gropius::task::{
    adapters::memory::InMemoryTaskRepository, domain::Task, services::TaskLifecycleService,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;

/// Engine type used by the BDD world.
pub type TestEngine = Engine<
    InMemoryAgentCardRepository,
    InMemoryTaskRepository,
    InMemoryAgentTransport,
    InMemoryMetricsSource,
    DefaultClock,
>;

/// Scenario world for task orchestration behaviour tests.
pub struct OrchestrationWorld {
    /// Engine under test.
    pub engine: TestEngine,
    /// Scripted agents answering dispatches.
    pub transport: Arc<InMemoryAgentTransport>,
    /// Scripted metrics endpoints.
    pub metrics: Arc<InMemoryMetricsSource>,
    /// Card documents registered so far, keyed by agent id.
    pub documents: Vec<(String, String)>,
    /// Result of the last task creation.
    pub last_creation: Option<Result<Task, OrchestratorError>>,
    /// Outcome of the last direct registration.
    pub last_registration: Option<RegistrationOutcome>,
    /// Resolution order captured for later comparison.
    pub recorded_resolution: Option<Vec<AgentId>>,
}

impl OrchestrationWorld {
    /// Creates a world over in-memory adapters with local intervals.
    ///
    /// # Panics
    ///
    /// Panics if the local configuration preset is invalid.
    #[must_use]
    pub fn new() -> Self {
        let settings = EngineConfig::local()
            .orchestrator_settings()
            .expect("local preset should be valid");
        let clock = Arc::new(DefaultClock);
        let transport = Arc::new(InMemoryAgentTransport::new());
        let metrics = Arc::new(InMemoryMetricsSource::new());
        let orchestrator = Orchestrator::new(
            AgentRegistryService::new(Arc::new(InMemoryAgentCardRepository::new())),
            TaskLifecycleService::new(Arc::new(InMemoryTaskRepository::new()), Arc::clone(&clock)),
            AgentClient::new(Arc::clone(&transport), EngineConfig::local().request_timeout()),
            Arc::clone(&clock),
            settings,
        );
        let collector = MetricsCollector::new(Arc::clone(&metrics), clock);

        Self {
            engine: Engine::new(orchestrator, collector),
            transport,
            metrics,
            documents: Vec::new(),
            last_creation: None,
            last_registration: None,
            recorded_resolution: None,
        }
    }

    /// Returns the card document registered for `agent`.
    ///
    /// # Errors
    ///
    /// Returns an error when no card was registered for the agent.
    pub fn document_of(&self, agent: &str) -> Result<&str, eyre::Report> {
        self.documents
            .iter()
            .find(|(agent_id, _)| agent_id == agent)
            .map(|(_, document)| document.as_str())
            .ok_or_else(|| eyre::eyre!("no card registered for agent '{agent}'"))
    }
}

impl Default for OrchestrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrchestrationWorld {
    OrchestrationWorld::default()
}

/// Builds the Agent Card document of an agent offering one capability.
#[must_use]
pub fn card_document(agent: &str, capability: &str) -> String {
    json!({
        "agent_id": agent,
        "capabilities": [{ "id": capability }],
        "endpoints": {
            "base_url": format!("http://{agent}.agents.test"),
            "task_create": "/v1/tasks",
            "task_status": "/v1/tasks/{task_id}",
        },
        "metadata": {
            "backend": "ollama",
            "concurrency_limit": 4,
            "response_time_sla_ms": 2_000,
        },
    })
    .to_string()
}

/// Parses a card document.
///
/// # Errors
///
/// Returns an error when the document is not a valid card.
pub fn parse_card(document: &str) -> Result<AgentCard, eyre::Report> {
    AgentCard::from_json(document).map_err(|err| eyre::eyre!("invalid card document: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
