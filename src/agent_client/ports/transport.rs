//! Transport port for agent task endpoints.

use crate::agent_client::domain::{DispatchAck, TaskCreateRequest};
use crate::agent_registry::domain::{AgentCard, AgentId};
use crate::task::domain::{TaskId, TaskStatusReport};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for agent transport operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Contract for talking to an agent's task endpoints.
///
/// Implementations report faults as [`DispatchError`] and must not decide
/// retry policy; retries and failover belong to the orchestrator.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Posts a task-creation request to the agent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Rejected`] when the agent refuses the request
    /// and a retryable variant for transport faults.
    async fn dispatch(
        &self,
        card: &AgentCard,
        request: &TaskCreateRequest,
    ) -> DispatchResult<DispatchAck>;

    /// Fetches the agent's status document for a task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the status cannot be retrieved.
    async fn poll_status(
        &self,
        card: &AgentCard,
        task_id: &TaskId,
    ) -> DispatchResult<TaskStatusReport>;

    /// Asks the agent to stop working on a task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the request cannot be delivered.
    async fn cancel(&self, card: &AgentCard, task_id: &TaskId) -> DispatchResult<()>;
}

/// Errors returned by agent transports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The request could not be delivered or the agent answered with a
    /// server-side failure.
    #[error("transport failure reaching agent {agent_id}: {message}")]
    Transport {
        /// Agent that could not be reached.
        agent_id: AgentId,
        /// Failure description.
        message: String,
    },

    /// The agent did not answer within the per-attempt timeout.
    #[error("agent {agent_id} did not answer within {timeout_ms} ms")]
    Timeout {
        /// Agent that timed out.
        agent_id: AgentId,
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// No credential could be obtained for the agent's audience.
    #[error("no credential available for agent {agent_id}: {message}")]
    Authentication {
        /// Agent whose audience lacked a token.
        agent_id: AgentId,
        /// Failure description.
        message: String,
    },

    /// The agent refused the request.
    #[error("agent {agent_id} rejected the request: {reason}")]
    Rejected {
        /// Refusing agent.
        agent_id: AgentId,
        /// Refusal reason.
        reason: String,
    },

    /// The agent answered with a body that could not be decoded.
    #[error("agent {agent_id} sent a malformed response: {message}")]
    MalformedResponse {
        /// Agent that answered.
        agent_id: AgentId,
        /// Decoding failure.
        message: String,
    },
}

impl DispatchError {
    /// Returns whether another attempt, possibly on another agent, may
    /// succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    /// Returns the agent the error concerns.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        match self {
            Self::Transport { agent_id, .. }
            | Self::Timeout { agent_id, .. }
            | Self::Authentication { agent_id, .. }
            | Self::Rejected { agent_id, .. }
            | Self::MalformedResponse { agent_id, .. } => agent_id,
        }
    }
}
