//! Timeout-bounded agent client.

use super::subscription::{PollSettings, StatusSubscription};
use crate::agent_client::{
    domain::TaskCreateRequest,
    ports::{AgentTransport, DispatchError, DispatchResult},
};
use crate::agent_registry::{domain::AgentCard, ports::AgentPresence};
use crate::task::domain::{Task, TaskId, TaskStatusReport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends requests to agents, bounding every attempt by a timeout.
pub struct AgentClient<T>
where
    T: AgentTransport,
{
    transport: Arc<T>,
    request_timeout: Duration,
}

impl<T> Clone for AgentClient<T>
where
    T: AgentTransport,
{
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            request_timeout: self.request_timeout,
        }
    }
}

impl<T> AgentClient<T>
where
    T: AgentTransport + 'static,
{
    /// Creates a client with a per-attempt request timeout.
    #[must_use]
    pub const fn new(transport: Arc<T>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
        }
    }

    /// Returns the per-attempt request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Dispatches a stored task to an agent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Rejected`] when the agent refuses the task,
    /// [`DispatchError::Timeout`] when the attempt exceeds the timeout, or
    /// the transport's error otherwise.
    pub async fn dispatch(&self, card: &AgentCard, task: &Task) -> DispatchResult<()> {
        let request = TaskCreateRequest::for_task(task);
        let ack = self
            .bounded(card, self.transport.dispatch(card, &request))
            .await?;
        if !ack.accepted {
            return Err(DispatchError::Rejected {
                agent_id: card.agent_id().clone(),
                reason: ack
                    .reason
                    .unwrap_or_else(|| "agent refused the task".to_owned()),
            });
        }
        debug!(task_id = %task.id(), agent_id = %card.agent_id(), "agent accepted task");
        Ok(())
    }

    /// Fetches the agent's status document for a task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Timeout`] when the attempt exceeds the
    /// timeout, or the transport's error otherwise.
    pub async fn poll_status(
        &self,
        card: &AgentCard,
        task_id: &TaskId,
    ) -> DispatchResult<TaskStatusReport> {
        self.bounded(card, self.transport.poll_status(card, task_id))
            .await
    }

    /// Asks the agent to stop a task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the request cannot be delivered.
    pub async fn cancel(&self, card: &AgentCard, task_id: &TaskId) -> DispatchResult<()> {
        self.bounded(card, self.transport.cancel(card, task_id))
            .await
    }

    /// Follows a task's status on the agent executing it.
    #[must_use]
    pub fn subscribe(
        &self,
        card: AgentCard,
        task_id: TaskId,
        presence: Arc<dyn AgentPresence>,
        settings: PollSettings,
    ) -> StatusSubscription<T> {
        StatusSubscription::new(self.clone(), card, task_id, presence, settings)
    }

    async fn bounded<F, V>(&self, card: &AgentCard, attempt: F) -> DispatchResult<V>
    where
        F: Future<Output = DispatchResult<V>>,
    {
        tokio::time::timeout(self.request_timeout, attempt)
            .await
            .map_err(|_| DispatchError::Timeout {
                agent_id: card.agent_id().clone(),
                timeout_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}
