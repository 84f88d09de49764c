//! Load signals consulted when ranking candidates.

use super::AgentId;
use std::collections::HashMap;

/// Last known load of one agent as seen by routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSignal {
    /// Queue depth from the latest metrics cycle; `None` when unknown.
    pub queue_depth: Option<u32>,
    /// Average response time from the latest metrics cycle.
    pub avg_response_time_ms: Option<u64>,
    /// Whether the agent is inside a downgrade cool-down window.
    pub downgraded: bool,
}

impl LoadSignal {
    /// Creates a signal for an agent with a known queue depth.
    #[must_use]
    pub const fn with_queue_depth(queue_depth: u32) -> Self {
        Self {
            queue_depth: Some(queue_depth),
            avg_response_time_ms: None,
            downgraded: false,
        }
    }
}

/// Point-in-time view of load signals keyed by agent.
///
/// Agents absent from the view rank as if nothing is known about them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingView {
    signals: HashMap<AgentId, LoadSignal>,
}

impl RoutingView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the signal for an agent.
    #[must_use]
    pub fn with_signal(mut self, agent_id: AgentId, signal: LoadSignal) -> Self {
        self.signals.insert(agent_id, signal);
        self
    }

    /// Adds or replaces the signal for an agent in place.
    pub fn insert(&mut self, agent_id: AgentId, signal: LoadSignal) {
        self.signals.insert(agent_id, signal);
    }

    /// Returns the signal for an agent, defaulting to unknown load.
    #[must_use]
    pub fn signal(&self, agent_id: &AgentId) -> LoadSignal {
        self.signals.get(agent_id).copied().unwrap_or_default()
    }

    /// Returns the number of agents with a recorded signal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns whether no signals are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
