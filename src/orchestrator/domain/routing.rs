//! Metrics-driven routing downgrades.

use crate::agent_registry::domain::{AgentCard, AgentId, LoadSignal, RoutingView};
use crate::metrics::domain::{AgentMetricsSnapshot, QueueDepth};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Thresholds deciding when an agent is downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingSettings {
    /// Queue depth at or above which an agent is downgraded.
    pub queue_high_water: u32,
    /// How long a downgrade lasts after the last offending snapshot.
    pub cooldown: Duration,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            queue_high_water: 10,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Why an agent ranks last for a while.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DowngradeReason {
    /// Metrics could not be collected.
    MetricsUnknown {
        /// Collection failure, when recorded.
        last_error: Option<String>,
    },
    /// The 95th percentile response time exceeded the declared SLA.
    SlaBreached {
        /// Reported p95 in milliseconds.
        p95_ms: u64,
        /// Declared SLA in milliseconds.
        sla_ms: u64,
    },
    /// The queue reached the high-water mark.
    QueueSaturated {
        /// Reported queue depth.
        depth: u32,
        /// Configured high-water mark.
        high_water: u32,
    },
}

impl fmt::Display for DowngradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetricsUnknown {
                last_error: Some(error),
            } => write!(f, "metrics unknown: {error}"),
            Self::MetricsUnknown { last_error: None } => f.write_str("metrics unknown"),
            Self::SlaBreached { p95_ms, sla_ms } => {
                write!(f, "p95 {p95_ms} ms exceeds SLA {sla_ms} ms")
            }
            Self::QueueSaturated { depth, high_water } => {
                write!(f, "queue depth {depth} reached high-water mark {high_water}")
            }
        }
    }
}

impl DowngradeReason {
    /// Assesses one snapshot against the card's SLA and the thresholds.
    ///
    /// Returns `None` for a healthy agent.
    #[must_use]
    pub fn assess(
        card: &AgentCard,
        snapshot: &AgentMetricsSnapshot,
        settings: &RoutingSettings,
    ) -> Option<Self> {
        let metrics = snapshot.metrics();
        let depth = match metrics.queue_depth {
            QueueDepth::Unknown => {
                return Some(Self::MetricsUnknown {
                    last_error: metrics.last_error.clone(),
                });
            }
            QueueDepth::Known(depth) => depth,
        };

        let sla_ms = card.metadata().response_time_sla_ms();
        if let Some(p95_ms) = metrics.p95_response_time_ms
            && p95_ms > sla_ms
        {
            return Some(Self::SlaBreached { p95_ms, sla_ms });
        }
        (depth >= settings.queue_high_water).then_some(Self::QueueSaturated {
            depth,
            high_water: settings.queue_high_water,
        })
    }
}

/// An active downgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downgrade {
    /// What triggered it.
    pub reason: DowngradeReason,
    /// When it lapses.
    pub until: DateTime<Utc>,
}

/// Load signals and downgrades derived from metrics cycles.
///
/// Owned by the orchestrator and handed to the registry as a
/// [`RoutingView`] snapshot, so ranking never reads collector state.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    settings: RoutingSettings,
    signals: HashMap<AgentId, LoadSignal>,
    downgrades: HashMap<AgentId, Downgrade>,
}

impl RoutingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(settings: RoutingSettings) -> Self {
        Self {
            settings,
            signals: HashMap::new(),
            downgrades: HashMap::new(),
        }
    }

    /// Returns the downgrade thresholds.
    #[must_use]
    pub const fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    /// Records one snapshot, downgrading the agent when it is unhealthy.
    ///
    /// A fresh offending snapshot restarts the cool-down. A healthy snapshot
    /// leaves an existing downgrade to lapse on its own.
    pub fn record(
        &mut self,
        card: &AgentCard,
        snapshot: &AgentMetricsSnapshot,
        now: DateTime<Utc>,
    ) -> Option<DowngradeReason> {
        self.signals
            .insert(card.agent_id().clone(), snapshot.load_signal());
        let reason = DowngradeReason::assess(card, snapshot, &self.settings)?;
        let cooldown = TimeDelta::from_std(self.settings.cooldown).unwrap_or(TimeDelta::MAX);
        let until = now
            .checked_add_signed(cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.downgrades.insert(
            card.agent_id().clone(),
            Downgrade {
                reason: reason.clone(),
                until,
            },
        );
        Some(reason)
    }

    /// Returns the downgrade in force for an agent at `now`.
    #[must_use]
    pub fn downgrade_of(&self, agent_id: &AgentId, now: DateTime<Utc>) -> Option<&Downgrade> {
        self.downgrades
            .get(agent_id)
            .filter(|downgrade| now < downgrade.until)
    }

    /// Drops everything known about an agent.
    pub fn forget(&mut self, agent_id: &AgentId) {
        self.signals.remove(agent_id);
        self.downgrades.remove(agent_id);
    }

    /// Drops downgrades that lapsed before `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.downgrades.retain(|_, downgrade| now < downgrade.until);
    }

    /// Builds the ranking input in force at `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> RoutingView {
        let agents = self.signals.keys().chain(self.downgrades.keys());
        let mut view = RoutingView::new();
        for agent_id in agents {
            let mut signal = self.signals.get(agent_id).copied().unwrap_or_default();
            signal.downgraded = self.downgrade_of(agent_id, now).is_some();
            view.insert(agent_id.clone(), signal);
        }
        view
    }
}
