//! Polling-backed status subscriptions.

use super::client::AgentClient;
use crate::agent_client::{domain::StatusEvent, ports::AgentTransport};
use crate::agent_registry::{domain::AgentCard, ports::AgentPresence};
use crate::task::domain::{TaskId, TaskStatusReport};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Polling cadence and failure tolerance for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between consecutive polls.
    pub interval: Duration,
    /// Consecutive retryable poll failures after which the agent is
    /// considered lost; zero is treated as one.
    pub max_consecutive_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_consecutive_failures: 5,
        }
    }
}

/// Follows one task on the agent executing it.
///
/// Each call to [`StatusSubscription::events`] starts an independent pass
/// that polls lazily as the stream is consumed. A pass yields only status
/// changes, yields the terminal status exactly once and then ends, and ends
/// with [`StatusEvent::AgentLost`] when the agent is deregistered or stops
/// answering.
pub struct StatusSubscription<T>
where
    T: AgentTransport,
{
    client: AgentClient<T>,
    card: AgentCard,
    task_id: TaskId,
    presence: Arc<dyn AgentPresence>,
    settings: PollSettings,
}

impl<T> StatusSubscription<T>
where
    T: AgentTransport + 'static,
{
    pub(super) fn new(
        client: AgentClient<T>,
        card: AgentCard,
        task_id: TaskId,
        presence: Arc<dyn AgentPresence>,
        settings: PollSettings,
    ) -> Self {
        Self {
            client,
            card,
            task_id,
            presence,
            settings,
        }
    }

    /// Returns the followed task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Starts a new pass over the task's status changes.
    #[must_use]
    pub fn events(&self) -> BoxStream<'static, StatusEvent> {
        let cursor = PollCursor {
            client: self.client.clone(),
            card: self.card.clone(),
            task_id: self.task_id.clone(),
            presence: Arc::clone(&self.presence),
            settings: self.settings,
            last: None,
            failures: 0,
            started: false,
            finished: false,
        };
        stream::unfold(cursor, PollCursor::advance).boxed()
    }
}

struct PollCursor<T>
where
    T: AgentTransport,
{
    client: AgentClient<T>,
    card: AgentCard,
    task_id: TaskId,
    presence: Arc<dyn AgentPresence>,
    settings: PollSettings,
    last: Option<TaskStatusReport>,
    failures: u32,
    started: bool,
    finished: bool,
}

impl<T> PollCursor<T>
where
    T: AgentTransport + 'static,
{
    async fn advance(mut self) -> Option<(StatusEvent, Self)> {
        loop {
            if self.finished {
                return None;
            }
            if self.started {
                tokio::time::sleep(self.settings.interval).await;
            }
            self.started = true;

            if !self.presence.is_registered(self.card.agent_id()).await {
                return Some(self.lost("agent deregistered".to_owned()));
            }

            match self.client.poll_status(&self.card, &self.task_id).await {
                Ok(report) => {
                    self.failures = 0;
                    if self.last.as_ref() == Some(&report) {
                        continue;
                    }
                    self.last = Some(report.clone());
                    self.finished = report.status.is_terminal();
                    let event = StatusEvent::Observed {
                        task_id: self.task_id.clone(),
                        agent_id: self.card.agent_id().clone(),
                        report,
                    };
                    return Some((event, self));
                }
                Err(err) if !err.is_retryable() => {
                    return Some(self.lost(err.to_string()));
                }
                Err(err) => {
                    self.failures = self.failures.saturating_add(1);
                    if self.failures >= self.settings.max_consecutive_failures.max(1) {
                        return Some(self.lost(err.to_string()));
                    }
                    debug!(
                        task_id = %self.task_id,
                        failures = self.failures,
                        error = %err,
                        "status poll failed"
                    );
                }
            }
        }
    }

    fn lost(mut self, reason: String) -> (StatusEvent, Self) {
        warn!(
            task_id = %self.task_id,
            agent_id = %self.card.agent_id(),
            %reason,
            "lost track of agent"
        );
        self.finished = true;
        let event = StatusEvent::AgentLost {
            task_id: self.task_id.clone(),
            agent_id: self.card.agent_id().clone(),
            reason,
        };
        (event, self)
    }
}
