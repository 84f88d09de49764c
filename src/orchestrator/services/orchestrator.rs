//! Task creation, delegation with failover, and status tracking.

use crate::agent_client::{
    domain::StatusEvent,
    ports::{AgentTransport, DispatchError},
    services::AgentClient,
};
use crate::agent_registry::{
    domain::{AgentCard, AgentId, CapabilityId, RoutingView, SchemaMismatch},
    ports::AgentCardRepository,
    services::{AgentRegistryError, AgentRegistryService},
};
use crate::metrics::domain::AgentMetricsSnapshot;
use crate::orchestrator::domain::{
    DispatchPhase, DowngradeReason, OrchestratorSettings, PlanError, RoutingTable,
};
use crate::task::{
    domain::{
        FailureKind, NewTask, StatusUpdate, Task, TaskDomainError, TaskFailure, TaskId,
        TaskStatus, TaskStatusReport,
    },
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleService},
};
use futures::StreamExt;
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The payload does not match the capability's input schema.
    #[error("payload for capability {capability} rejected: {mismatch}")]
    Validation {
        /// Target capability.
        capability: CapabilityId,
        /// Structural mismatch found.
        #[source]
        mismatch: SchemaMismatch,
    },

    /// No registered agent offers the capability.
    #[error("no registered agent offers capability {0}")]
    NoCapableAgent(CapabilityId),

    /// Every dispatch attempt within the retry budget failed.
    #[error("task {task_id} failed after {attempts} dispatch attempts: {reason}")]
    AgentUnavailable {
        /// Undeliverable task.
        task_id: TaskId,
        /// Dispatch attempts made.
        attempts: u32,
        /// Recorded failure reason.
        reason: String,
    },

    /// An agent rejected the task.
    #[error("task {task_id} rejected")]
    Rejected {
        /// Rejected task.
        task_id: TaskId,
        /// Rejection returned by the agent.
        #[source]
        source: DispatchError,
    },

    /// The task has no owning agent to follow.
    #[error("task {0} has not been delegated")]
    NotDelegated(TaskId),

    /// The planner's result is not a usable plan.
    #[error("planner task {task_id} returned an unusable plan")]
    InvalidPlan {
        /// Planner task.
        task_id: TaskId,
        /// Why the plan was refused.
        #[source]
        source: PlanError,
    },

    /// Too few children completed within the aggregation timeout.
    #[error(
        "aggregation for task {task_id} timed out with {completed} of {total} children completed"
    )]
    AggregationTimedOut {
        /// Parent whose children were awaited.
        task_id: TaskId,
        /// Children completed at the deadline.
        completed: usize,
        /// Children known at the deadline.
        total: usize,
    },

    /// A pipeline stage ended failed.
    #[error("task {task_id} failed: {failure}")]
    TaskFailed {
        /// Failed task.
        task_id: TaskId,
        /// Recorded failure.
        failure: TaskFailure,
    },

    /// A derived task identifier is invalid.
    #[error(transparent)]
    Identifier(#[from] TaskDomainError),

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] AgentRegistryError),

    /// A task store operation failed.
    #[error(transparent)]
    Tasks(#[from] TaskLifecycleError),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Drives tasks from creation to a terminal status across agents.
pub struct Orchestrator<R, S, T, C>
where
    R: AgentCardRepository,
    S: TaskRepository,
    T: AgentTransport,
    C: Clock + Send + Sync,
{
    pub(super) registry: AgentRegistryService<R>,
    pub(super) tasks: TaskLifecycleService<S, C>,
    client: AgentClient<T>,
    clock: Arc<C>,
    pub(super) settings: Arc<OrchestratorSettings>,
    routing: Arc<RwLock<RoutingTable>>,
    phases: Arc<RwLock<HashMap<TaskId, DispatchPhase>>>,
    assignments: Arc<RwLock<HashMap<TaskId, AgentCard>>>,
}

impl<R, S, T, C> Clone for Orchestrator<R, S, T, C>
where
    R: AgentCardRepository,
    S: TaskRepository,
    T: AgentTransport,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            tasks: self.tasks.clone(),
            client: self.client.clone(),
            clock: Arc::clone(&self.clock),
            settings: Arc::clone(&self.settings),
            routing: Arc::clone(&self.routing),
            phases: Arc::clone(&self.phases),
            assignments: Arc::clone(&self.assignments),
        }
    }
}

impl<R, S, T, C> Orchestrator<R, S, T, C>
where
    R: AgentCardRepository + 'static,
    S: TaskRepository + 'static,
    T: AgentTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Assembles an orchestrator over the registry, task store and client.
    #[must_use]
    pub fn new(
        registry: AgentRegistryService<R>,
        tasks: TaskLifecycleService<S, C>,
        client: AgentClient<T>,
        clock: Arc<C>,
        settings: OrchestratorSettings,
    ) -> Self {
        let routing = RoutingTable::new(settings.routing);
        Self {
            registry,
            tasks,
            client,
            clock,
            settings: Arc::new(settings),
            routing: Arc::new(RwLock::new(routing)),
            phases: Arc::new(RwLock::new(HashMap::new())),
            assignments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the agent registry.
    #[must_use]
    pub const fn registry(&self) -> &AgentRegistryService<R> {
        &self.registry
    }

    /// Returns the task store service.
    #[must_use]
    pub const fn tasks(&self) -> &TaskLifecycleService<S, C> {
        &self.tasks
    }

    /// Returns the active tunables.
    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Returns the dispatch phase of a task still in flight.
    ///
    /// Bookkeeping is released once the stored task is terminal, so
    /// finished tasks report `None`.
    #[must_use]
    pub fn phase(&self, task_id: &TaskId) -> Option<DispatchPhase> {
        read(&self.phases).get(task_id).copied()
    }

    /// Returns the agent that accepted a task still in flight.
    #[must_use]
    pub fn assignment(&self, task_id: &TaskId) -> Option<AgentCard> {
        read(&self.assignments).get(task_id).cloned()
    }

    /// Returns the ranking input currently in force.
    #[must_use]
    pub fn routing_view(&self) -> RoutingView {
        read(&self.routing).view(self.clock.utc())
    }

    /// Validates and stores a new task.
    ///
    /// The payload is checked against the input schema of the earliest
    /// registered card offering the capability. Nothing is stored when no
    /// card offers it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoCapableAgent`],
    /// [`OrchestratorError::Validation`], or the task store's creation errors.
    #[instrument(
        skip(self, new_task),
        fields(task_id = %new_task.id(), capability = %new_task.capability())
    )]
    pub async fn create_task(&self, new_task: NewTask) -> OrchestratorResult<Task> {
        let capability = new_task.capability().clone();
        let schema = self
            .registry
            .input_schema_for(&capability)
            .await?
            .ok_or_else(|| OrchestratorError::NoCapableAgent(capability.clone()))?;
        schema
            .check(new_task.payload())
            .map_err(|mismatch| OrchestratorError::Validation {
                capability,
                mismatch,
            })?;

        let task = self.tasks.create(new_task).await?;
        self.enter(task.id(), DispatchPhase::Created);
        Ok(task)
    }

    /// Sends a stored task to the best available agent.
    ///
    /// Each pass tries at most `max_attempts` candidates in ranked order,
    /// those not yet attempted first; transport faults fail over to the next
    /// candidate. Passes within the retry budget may retry agents that
    /// already failed, after a backoff. Later passes only reach agents not
    /// yet attempted, so the task is declared unavailable once every ranked
    /// candidate has failed. The stored task stays pending until the owning
    /// agent reports progress.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoCapableAgent`] when no agent offers
    /// the capability, [`OrchestratorError::Rejected`] when an agent refuses
    /// the task, and [`OrchestratorError::AgentUnavailable`] when every
    /// attempt failed; the task is marked failed with the matching
    /// [`FailureKind`] in each case.
    #[instrument(skip(self))]
    pub async fn delegate(&self, task_id: &TaskId) -> OrchestratorResult<AgentCard> {
        let task = self.tasks.get(task_id).await?;
        if task.is_terminal() {
            return Err(TaskLifecycleError::Domain(TaskDomainError::TerminalTaskMutation {
                task_id: task_id.clone(),
                status: task.status(),
            })
            .into());
        }

        let dispatch = self.settings.dispatch;
        let per_pass = usize::try_from(dispatch.max_attempts.max(1)).unwrap_or(usize::MAX);
        let mut attempts: u32 = 0;
        let mut tried: HashSet<AgentId> = HashSet::new();
        let mut last_error: Option<DispatchError> = None;

        for pass in 0_u32.. {
            let within_budget = pass <= dispatch.retry_budget;
            let candidates = match self
                .registry
                .resolve(task.capability(), &self.routing_view())
                .await
            {
                Ok(candidates) => candidates,
                Err(AgentRegistryError::NoCapableAgent(capability)) if attempts == 0 => {
                    self.enter(task_id, DispatchPhase::Failed);
                    self.fail_task(
                        task_id,
                        FailureKind::NoCapableAgent,
                        format!("no registered agent offers capability {capability}"),
                    )
                    .await?;
                    return Err(OrchestratorError::NoCapableAgent(capability));
                }
                Err(AgentRegistryError::NoCapableAgent(_)) => break,
                Err(err) => return Err(err.into()),
            };

            let Some(queue) = pass_queue(candidates, &tried, within_budget, per_pass) else {
                break;
            };
            if pass > 0 {
                debug!(pass, backoff = ?dispatch.retry_backoff, "retrying delegation");
                tokio::time::sleep(dispatch.retry_backoff).await;
            }

            for card in &queue {
                if attempts > 0 {
                    self.enter(task_id, DispatchPhase::Retrying);
                }
                self.enter(task_id, DispatchPhase::Dispatched);
                attempts = attempts.saturating_add(1);
                tried.insert(card.agent_id().clone());

                match self.client.dispatch(card, &task).await {
                    Ok(()) => {
                        info!(agent_id = %card.agent_id(), attempts, "task delegated");
                        write(&self.assignments).insert(task_id.clone(), card.clone());
                        return Ok(card.clone());
                    }
                    Err(err) if !err.is_retryable() => {
                        self.enter(task_id, DispatchPhase::Failed);
                        self.fail_task(task_id, FailureKind::Rejected, err.to_string())
                            .await?;
                        return Err(OrchestratorError::Rejected {
                            task_id: task_id.clone(),
                            source: err,
                        });
                    }
                    Err(err) => {
                        warn!(
                            agent_id = %card.agent_id(),
                            attempt = attempts,
                            error = %err,
                            "dispatch attempt failed"
                        );
                        self.enter(task_id, DispatchPhase::Failed);
                        last_error = Some(err);
                    }
                }
            }
        }

        let reason = last_error.map_or_else(
            || "no candidate agent remained registered".to_owned(),
            |err| format!("all {attempts} dispatch attempts failed; last error: {err}"),
        );
        self.fail_task(task_id, FailureKind::AgentUnavailable, reason.clone())
            .await?;
        Err(OrchestratorError::AgentUnavailable {
            task_id: task_id.clone(),
            attempts,
            reason,
        })
    }

    /// Follows a delegated task until it is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotDelegated`] when no agent accepted
    /// the unfinished task, or the errors of [`Self::receive_status`].
    #[instrument(skip(self))]
    pub async fn track(&self, task_id: &TaskId) -> OrchestratorResult<Task> {
        let Some(card) = self.assignment(task_id) else {
            let current = self.tasks.get(task_id).await?;
            if current.is_terminal() {
                return Ok(current);
            }
            return Err(OrchestratorError::NotDelegated(task_id.clone()));
        };
        let subscription = self.client.subscribe(
            card,
            task_id.clone(),
            Arc::new(self.registry.clone()),
            self.settings.tracking,
        );

        let mut events = subscription.events();
        while let Some(event) = events.next().await {
            self.receive_status(event).await?;
            let current = self.tasks.get(task_id).await?;
            if current.is_terminal() {
                return Ok(current);
            }
        }
        Ok(self.tasks.get(task_id).await?)
    }

    /// Delegates a task and follows it until it is terminal.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::delegate`] and [`Self::track`].
    pub async fn execute(&self, task_id: &TaskId) -> OrchestratorResult<Task> {
        self.delegate(task_id).await?;
        self.track(task_id).await
    }

    /// Applies a status event observed by polling or pushed by an agent.
    ///
    /// Returns the updated task, or `None` when the event was discarded:
    /// reports for terminal tasks, reports from an agent that does not own
    /// the task, and `pending` reports carry no change.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Tasks`] when the report violates the
    /// transition rules or the store fails. A refused report from the owning
    /// agent also fails the task with [`FailureKind::ProtocolViolation`].
    #[instrument(skip(self, event), fields(task_id = %event.task_id()))]
    pub async fn receive_status(&self, event: StatusEvent) -> OrchestratorResult<Option<Task>> {
        match event {
            StatusEvent::Observed {
                task_id,
                agent_id,
                report,
            } => self.apply_report(&task_id, &agent_id, &report).await,
            StatusEvent::AgentLost {
                task_id,
                agent_id,
                reason,
            } => {
                if self.tasks.get(&task_id).await?.is_terminal() {
                    return Ok(None);
                }
                self.enter(&task_id, DispatchPhase::Failed);
                self.fail_task(
                    &task_id,
                    FailureKind::AgentUnavailable,
                    format!("lost agent {agent_id}: {reason}"),
                )
                .await
            }
        }
    }

    async fn apply_report(
        &self,
        task_id: &TaskId,
        agent_id: &AgentId,
        report: &TaskStatusReport,
    ) -> OrchestratorResult<Option<Task>> {
        if let Some(owner) = self.assignment(task_id)
            && owner.agent_id() != agent_id
        {
            warn!(%agent_id, owner = %owner.agent_id(), "discarding report from non-owning agent");
            return Ok(None);
        }
        let Some(update) = report.to_update() else {
            return Ok(None);
        };
        let phase = match update.target_status() {
            TaskStatus::Completed => DispatchPhase::Completed,
            TaskStatus::Failed => DispatchPhase::Failed,
            TaskStatus::Pending | TaskStatus::Running => DispatchPhase::Running,
        };

        match self.tasks.update_status(task_id, update).await {
            Ok(task) => {
                self.enter(task_id, phase);
                if task.is_terminal() {
                    info!(%agent_id, status = %task.status(), "task reached terminal status");
                    self.release(task_id);
                }
                Ok(Some(task))
            }
            Err(err) if err.is_terminal_mutation() => {
                info!(%agent_id, "discarding late report for terminal task");
                Ok(None)
            }
            Err(TaskLifecycleError::Domain(violation)) => {
                warn!(%agent_id, error = %violation, "agent report refused; failing task");
                self.enter(task_id, DispatchPhase::Failed);
                self.fail_task(
                    task_id,
                    FailureKind::ProtocolViolation,
                    format!("agent {agent_id} sent an invalid report: {violation}"),
                )
                .await?;
                Err(TaskLifecycleError::Domain(violation).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Cancels a task and its non-terminal descendants.
    ///
    /// Each cancelled task that an agent accepted is also cancelled at the
    /// agent on a best-effort basis; delivery failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Tasks`] when the task is already terminal
    /// or the store fails.
    #[instrument(skip(self))]
    pub async fn cancel(&self, task_id: &TaskId, reason: &str) -> OrchestratorResult<Task> {
        let cancelled = self.tasks.cancel(task_id, reason).await?;
        self.enter(task_id, DispatchPhase::Failed);
        self.propagate_cancel(task_id).await;
        self.release(task_id);

        let mut parents = vec![task_id.clone()];
        while let Some(parent) = parents.pop() {
            for child in self.tasks.collect_children(&parent).await? {
                parents.push(child.id().clone());
                if child.is_terminal() {
                    continue;
                }
                match self.tasks.cancel(child.id(), reason).await {
                    Ok(_) => {
                        self.enter(child.id(), DispatchPhase::Failed);
                        self.propagate_cancel(child.id()).await;
                        self.release(child.id());
                    }
                    Err(err) if err.is_terminal_mutation() => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(cancelled)
    }

    async fn propagate_cancel(&self, task_id: &TaskId) {
        let Some(card) = self.assignment(task_id) else {
            return;
        };
        if let Err(err) = self.client.cancel(&card, task_id).await {
            warn!(%task_id, agent_id = %card.agent_id(), error = %err, "cancel not delivered");
        }
    }

    /// Feeds one metrics cycle into routing.
    ///
    /// Returns the agents downgraded by this cycle. Snapshots of agents no
    /// longer registered are dropped from routing.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Registry`] when card lookup fails.
    #[instrument(skip_all, fields(snapshots = snapshots.len()))]
    pub async fn apply_metrics_cycle(
        &self,
        snapshots: &[AgentMetricsSnapshot],
    ) -> OrchestratorResult<Vec<(AgentId, DowngradeReason)>> {
        let mut known = Vec::with_capacity(snapshots.len());
        let mut departed = Vec::new();
        for snapshot in snapshots {
            match self.registry.find(snapshot.agent_id()).await? {
                Some(card) => known.push((card, snapshot)),
                None => departed.push(snapshot.agent_id().clone()),
            }
        }

        let now = self.clock.utc();
        let mut routing = write(&self.routing);
        routing.prune(now);
        for agent_id in &departed {
            routing.forget(agent_id);
        }
        let downgraded: Vec<(AgentId, DowngradeReason)> = known
            .iter()
            .filter_map(|(card, snapshot)| {
                routing
                    .record(card, snapshot, now)
                    .map(|reason| (card.agent_id().clone(), reason))
            })
            .collect();
        drop(routing);

        for (agent_id, reason) in &downgraded {
            info!(%agent_id, %reason, "downgraded agent");
        }
        Ok(downgraded)
    }

    /// Marks a task failed unless it already is terminal.
    pub(super) async fn fail_task(
        &self,
        task_id: &TaskId,
        kind: FailureKind,
        reason: String,
    ) -> OrchestratorResult<Option<Task>> {
        let update = StatusUpdate::Failed {
            failure: TaskFailure::new(kind, reason),
        };
        match self.tasks.update_status(task_id, update).await {
            Ok(task) => {
                self.release(task_id);
                Ok(Some(task))
            }
            Err(err) if err.is_terminal_mutation() => {
                debug!(%task_id, "task already terminal; failure not recorded");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Drops the phase and assignment of a task whose stored status is final.
    fn release(&self, task_id: &TaskId) {
        write(&self.phases).remove(task_id);
        write(&self.assignments).remove(task_id);
    }

    fn enter(&self, task_id: &TaskId, next: DispatchPhase) {
        let mut phases = write(&self.phases);
        if let Some(current) = phases.get(task_id)
            && !current.can_advance_to(next)
        {
            warn!(%task_id, %current, %next, "unexpected dispatch phase change");
        }
        phases.insert(task_id.clone(), next);
    }
}

/// Picks the candidates for one delegation pass.
///
/// Agents not yet attempted come first. Past the retry budget only they are
/// eligible, and `None` means every ranked candidate has been tried.
fn pass_queue(
    candidates: Vec<AgentCard>,
    tried: &HashSet<AgentId>,
    within_budget: bool,
    per_pass: usize,
) -> Option<Vec<AgentCard>> {
    let (fresh, seen): (Vec<AgentCard>, Vec<AgentCard>) = candidates
        .into_iter()
        .partition(|card| !tried.contains(card.agent_id()));
    if within_budget {
        return Some(fresh.into_iter().chain(seen).take(per_pass).collect());
    }
    if fresh.is_empty() {
        return None;
    }
    Some(fresh.into_iter().take(per_pass).collect())
}

fn read<V>(lock: &RwLock<V>) -> RwLockReadGuard<'_, V> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<V>(lock: &RwLock<V>) -> RwLockWriteGuard<'_, V> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
