//! Scripted in-memory agent transport.

use crate::agent_client::{
    domain::{DispatchAck, TaskCreateRequest},
    ports::{AgentTransport, DispatchError, DispatchResult},
};
use crate::agent_registry::domain::{AgentCard, AgentId};
use crate::task::domain::{TaskId, TaskStatusReport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Computes the status an agent reports for a dispatched request.
pub type Responder = Arc<dyn Fn(&TaskCreateRequest) -> TaskStatusReport + Send + Sync>;

/// How a scripted agent answers.
#[derive(Clone, Default)]
pub enum AgentBehaviour {
    /// Accept tasks and report `pending` until a status is set.
    #[default]
    Accept,
    /// Accept tasks and immediately report the responder's status.
    Respond(Responder),
    /// Fail every request at the transport level.
    Unavailable,
    /// Refuse every dispatch with the given reason.
    Refuse(String),
    /// Never answer.
    Unresponsive,
}

impl AgentBehaviour {
    /// Accepts tasks and reports them completed with `result`.
    #[must_use]
    pub fn complete_with(result: serde_json::Value) -> Self {
        Self::Respond(Arc::new(move |_: &TaskCreateRequest| {
            TaskStatusReport::completed(result.clone())
        }))
    }
}

impl fmt::Debug for AgentBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("Accept"),
            Self::Respond(_) => f.write_str("Respond(..)"),
            Self::Unavailable => f.write_str("Unavailable"),
            Self::Refuse(reason) => f.debug_tuple("Refuse").field(reason).finish(),
            Self::Unresponsive => f.write_str("Unresponsive"),
        }
    }
}

/// One dispatch attempt seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    /// Agent the request was addressed to.
    pub agent_id: AgentId,
    /// Request body.
    pub request: TaskCreateRequest,
}

/// Thread-safe scripted agent transport.
///
/// Agents without a configured behaviour accept every task.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentTransport {
    state: Arc<RwLock<TransportState>>,
}

#[derive(Debug, Default)]
struct TransportState {
    behaviours: HashMap<AgentId, AgentBehaviour>,
    statuses: HashMap<TaskId, TaskStatusReport>,
    dispatches: Vec<DispatchRecord>,
    cancellations: Vec<(AgentId, TaskId)>,
}

impl InMemoryAgentTransport {
    /// Creates a transport where every agent accepts tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TransportState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TransportState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scripts how an agent answers.
    pub fn set_behaviour(&self, agent_id: &AgentId, behaviour: AgentBehaviour) {
        self.write().behaviours.insert(agent_id.clone(), behaviour);
    }

    /// Sets the status agents report for a task.
    pub fn set_status(&self, task_id: &TaskId, report: TaskStatusReport) {
        self.write().statuses.insert(task_id.clone(), report);
    }

    /// Returns every dispatch attempt in arrival order.
    #[must_use]
    pub fn dispatches(&self) -> Vec<DispatchRecord> {
        self.read().dispatches.clone()
    }

    /// Returns the agents that received a dispatch for `task_id`, in order.
    #[must_use]
    pub fn attempts_for(&self, task_id: &TaskId) -> Vec<AgentId> {
        self.read()
            .dispatches
            .iter()
            .filter(|record| &record.request.task_id == task_id)
            .map(|record| record.agent_id.clone())
            .collect()
    }

    /// Returns every cancellation request in arrival order.
    #[must_use]
    pub fn cancellations(&self) -> Vec<(AgentId, TaskId)> {
        self.read().cancellations.clone()
    }

    fn behaviour_of(&self, agent_id: &AgentId) -> AgentBehaviour {
        self.read()
            .behaviours
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn unavailable(card: &AgentCard) -> DispatchError {
    DispatchError::Transport {
        agent_id: card.agent_id().clone(),
        message: "connection refused".to_owned(),
    }
}

#[async_trait]
impl AgentTransport for InMemoryAgentTransport {
    async fn dispatch(
        &self,
        card: &AgentCard,
        request: &TaskCreateRequest,
    ) -> DispatchResult<DispatchAck> {
        let behaviour = self.behaviour_of(card.agent_id());
        self.write().dispatches.push(DispatchRecord {
            agent_id: card.agent_id().clone(),
            request: request.clone(),
        });

        match behaviour {
            AgentBehaviour::Accept => {
                self.write()
                    .statuses
                    .entry(request.task_id.clone())
                    .or_insert_with(TaskStatusReport::pending);
                Ok(DispatchAck::accepted())
            }
            AgentBehaviour::Respond(responder) => {
                self.set_status(&request.task_id, responder(request));
                Ok(DispatchAck::accepted())
            }
            AgentBehaviour::Unavailable => Err(unavailable(card)),
            AgentBehaviour::Refuse(reason) => Ok(DispatchAck::refused(reason)),
            AgentBehaviour::Unresponsive => std::future::pending().await,
        }
    }

    async fn poll_status(
        &self,
        card: &AgentCard,
        task_id: &TaskId,
    ) -> DispatchResult<TaskStatusReport> {
        match self.behaviour_of(card.agent_id()) {
            AgentBehaviour::Unavailable => Err(unavailable(card)),
            AgentBehaviour::Unresponsive => std::future::pending().await,
            _ => self.read().statuses.get(task_id).cloned().ok_or_else(|| {
                DispatchError::Rejected {
                    agent_id: card.agent_id().clone(),
                    reason: format!("unknown task {task_id}"),
                }
            }),
        }
    }

    async fn cancel(&self, card: &AgentCard, task_id: &TaskId) -> DispatchResult<()> {
        if matches!(
            self.behaviour_of(card.agent_id()),
            AgentBehaviour::Unavailable
        ) {
            return Err(unavailable(card));
        }
        self.write()
            .cancellations
            .push((card.agent_id().clone(), task_id.clone()));
        Ok(())
    }
}
