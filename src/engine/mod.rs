//! Wiring of the orchestrator, metrics collector, and their adapters.
//!
//! [`Engine::from_config`] assembles the production stack: the HTTP agent
//! transport with static bearer tokens, in-memory card and task stores, and
//! the system clock. [`Engine::new`] accepts any adapters, which is how
//! tests run the engine without a network.

use crate::agent_client::{
    adapters::{HttpAgentTransport, memory::StaticTokenProvider},
    ports::AgentTransport,
    services::{AgentClient, TokenCache},
};
use crate::agent_registry::{
    adapters::memory::InMemoryAgentCardRepository, domain::AgentId, ports::AgentCardRepository,
    services::AgentRegistryService,
};
use crate::config::{ConfigError, EngineConfig};
use crate::metrics::{
    domain::AgentMetricsSnapshot, ports::MetricsSource, services::MetricsCollector,
};
use crate::orchestrator::{
    domain::DowngradeReason,
    services::{Orchestrator, OrchestratorResult},
};
use crate::task::{
    adapters::memory::InMemoryTaskRepository, ports::TaskRepository,
    services::TaskLifecycleService,
};
use mockable::{Clock, DefaultClock};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// HTTP transport used by the production engine.
pub type HttpTransport = HttpAgentTransport<StaticTokenProvider, DefaultClock>;

/// Orchestrator over the production adapters.
pub type HttpOrchestrator =
    Orchestrator<InMemoryAgentCardRepository, InMemoryTaskRepository, HttpTransport, DefaultClock>;

/// Engine over the production adapters.
pub type HttpEngine = Engine<
    InMemoryAgentCardRepository,
    InMemoryTaskRepository,
    HttpTransport,
    HttpTransport,
    DefaultClock,
>;

/// Orchestrator paired with the collector that feeds its routing.
pub struct Engine<R, S, T, M, C>
where
    R: AgentCardRepository,
    S: TaskRepository,
    T: AgentTransport,
    M: MetricsSource,
    C: Clock + Send + Sync,
{
    orchestrator: Orchestrator<R, S, T, C>,
    collector: MetricsCollector<M, C>,
}

impl<R, S, T, M, C> Clone for Engine<R, S, T, M, C>
where
    R: AgentCardRepository,
    S: TaskRepository,
    T: AgentTransport,
    M: MetricsSource,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            collector: self.collector.clone(),
        }
    }
}

impl HttpEngine {
    /// Builds the production engine described by `config`.
    ///
    /// One HTTP transport serves both task dispatch and metrics collection,
    /// so token issuance is shared between them.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`EngineConfig::orchestrator_settings`].
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let settings = config.orchestrator_settings()?;
        let clock = Arc::new(DefaultClock);
        let provider: StaticTokenProvider = config
            .tokens
            .iter()
            .map(|(audience, token)| (audience.as_str(), token.as_str()))
            .collect();
        let transport = Arc::new(HttpAgentTransport::new(TokenCache::new(
            Arc::new(provider),
            Arc::clone(&clock),
        )));

        let orchestrator = Orchestrator::new(
            AgentRegistryService::new(Arc::new(InMemoryAgentCardRepository::new())),
            TaskLifecycleService::new(
                Arc::new(InMemoryTaskRepository::new()),
                Arc::clone(&clock),
            ),
            AgentClient::new(Arc::clone(&transport), config.request_timeout()),
            Arc::clone(&clock),
            settings,
        );
        let collector = MetricsCollector::new(transport, clock);
        Ok(Self::new(orchestrator, collector))
    }
}

impl<R, S, T, M, C> Engine<R, S, T, M, C>
where
    R: AgentCardRepository + 'static,
    S: TaskRepository + 'static,
    T: AgentTransport + 'static,
    M: MetricsSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Pairs an orchestrator with a metrics collector.
    #[must_use]
    pub const fn new(
        orchestrator: Orchestrator<R, S, T, C>,
        collector: MetricsCollector<M, C>,
    ) -> Self {
        Self {
            orchestrator,
            collector,
        }
    }

    /// Returns the orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &Orchestrator<R, S, T, C> {
        &self.orchestrator
    }

    /// Returns the metrics collector.
    #[must_use]
    pub const fn collector(&self) -> &MetricsCollector<M, C> {
        &self.collector
    }

    /// Collects metrics from every registered agent and applies them to
    /// routing.
    ///
    /// Snapshots of agents that left the registry are dropped from the
    /// collector and from routing. Returns the agents downgraded by this cycle.
    ///
    /// # Errors
    ///
    /// Returns the registry errors raised while listing or looking up cards.
    #[instrument(skip(self))]
    pub async fn run_metrics_cycle(&self) -> OrchestratorResult<Vec<(AgentId, DowngradeReason)>> {
        let cards = self.orchestrator.registry().list().await?;
        let registered: HashSet<&AgentId> = cards.iter().map(|card| card.agent_id()).collect();
        let departed: Vec<AgentMetricsSnapshot> = self
            .collector
            .snapshots()
            .into_iter()
            .filter(|snapshot| !registered.contains(snapshot.agent_id()))
            .collect();
        for snapshot in &departed {
            debug!(agent_id = %snapshot.agent_id(), "dropping metrics of departed agent");
            self.collector.forget(snapshot.agent_id());
        }

        let mut snapshots = self.collector.collect_all(&cards).await;
        snapshots.extend(departed);
        self.orchestrator.apply_metrics_cycle(&snapshots).await
    }

    /// Runs metrics cycles every `every` until `shutdown` turns `true` or its
    /// sender is dropped.
    ///
    /// The first cycle runs immediately. A failed cycle is logged and the
    /// loop carries on.
    pub fn spawn_metrics_loop(
        &self,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = every.as_millis(), "metrics loop started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = engine.run_metrics_cycle().await {
                            warn!(error = %err, "metrics cycle failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("metrics loop stopped");
        })
    }
}
