//! Shared engine construction for in-memory integration tests.

use std::sync::Arc;

use gropius::agent_client::{
    adapters::memory::{AgentBehaviour, InMemoryAgentTransport},
    domain::TaskCreateRequest,
    services::AgentClient,
};
use gropius::agent_registry::{
    adapters::memory::InMemoryAgentCardRepository, services::AgentRegistryService,
};
use gropius::config::EngineConfig;
use gropius::engine::Engine;
use gropius::metrics::{adapters::memory::InMemoryMetricsSource, services::MetricsCollector};
use gropius::orchestrator::services::Orchestrator;
use gropius::task::{
    adapters::memory::InMemoryTaskRepository, domain::TaskStatusReport,
    services::TaskLifecycleService,
};
use mockable::DefaultClock;
use serde_json::{Value, json};

/// Engine over in-memory adapters.
pub type TestEngine = Engine<
    InMemoryAgentCardRepository,
    InMemoryTaskRepository,
    InMemoryAgentTransport,
    InMemoryMetricsSource,
    DefaultClock,
>;

/// Engine plus the scripted transport behind it.
pub struct Fleet {
    /// Engine under test.
    pub engine: TestEngine,
    /// Scripted agents.
    pub transport: Arc<InMemoryAgentTransport>,
}

impl Fleet {
    /// Builds an engine configured by a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not a valid configuration.
    pub fn from_toml(document: &str) -> Result<Self, eyre::Report> {
        let config = EngineConfig::from_toml_str(document)?;
        let clock = Arc::new(DefaultClock);
        let transport = Arc::new(InMemoryAgentTransport::new());
        let orchestrator = Orchestrator::new(
            AgentRegistryService::new(Arc::new(InMemoryAgentCardRepository::new())),
            TaskLifecycleService::new(Arc::new(InMemoryTaskRepository::new()), Arc::clone(&clock)),
            AgentClient::new(Arc::clone(&transport), config.request_timeout()),
            Arc::clone(&clock),
            config.orchestrator_settings()?,
        );
        let collector = MetricsCollector::new(Arc::new(InMemoryMetricsSource::new()), clock);
        Ok(Self {
            engine: Engine::new(orchestrator, collector),
            transport,
        })
    }

    /// Registers an agent from its card document and scripts its answers.
    ///
    /// # Errors
    ///
    /// Returns an error when the card is refused.
    pub async fn agent(
        &self,
        agent: &str,
        capability: &str,
        behaviour: AgentBehaviour,
    ) -> Result<(), eyre::Report> {
        let card = self
            .engine
            .orchestrator()
            .registry()
            .register_document(&card_document(agent, capability))
            .await?;
        self.transport.set_behaviour(card.agent_id(), behaviour);
        Ok(())
    }
}

/// Configuration with short polls used by these tests.
pub const FAST_CONFIG: &str = r"
status_poll_interval_ms = 10

[dispatch]
retry_budget = 0

[aggregation]
poll_interval_ms = 10
";

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

/// Planner answering with a fixed list of research steps.
#[must_use]
pub fn planner(steps: &[&str]) -> AgentBehaviour {
    AgentBehaviour::complete_with(json!({ "steps": steps }))
}

/// Researcher echoing its query back as a single finding.
#[must_use]
pub fn researcher() -> AgentBehaviour {
    AgentBehaviour::Respond(Arc::new(|request: &TaskCreateRequest| {
        let query = request.payload.get("query").cloned().unwrap_or(Value::Null);
        TaskStatusReport::completed(json!([{ "source": query }]))
    }))
}

/// Synthesizer joining the sources of every finding.
#[must_use]
pub fn synthesizer() -> AgentBehaviour {
    AgentBehaviour::Respond(Arc::new(|request: &TaskCreateRequest| {
        let sources: Vec<Value> = request
            .payload
            .get("findings")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|finding| finding.pointer("/result/0/source").cloned())
            .collect();
        TaskStatusReport::completed(json!({ "sources": sources }))
    }))
}
