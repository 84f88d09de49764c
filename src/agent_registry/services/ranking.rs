//! Candidate ranking policies for capability resolution.

use crate::agent_registry::domain::{AgentCard, LoadSignal};
use std::cmp::Ordering;
use std::fmt;

/// A card offering the requested capability, with its routing inputs.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The candidate card.
    pub card: &'a AgentCard,
    /// Registration order of the card.
    pub position: u64,
    /// Load signal from the current routing view.
    pub signal: LoadSignal,
}

/// Orders candidates for delegation; earlier candidates are tried first.
///
/// Policies must be total orders that are deterministic for identical
/// inputs. Resolution sorts stably, so equal candidates keep registration
/// order.
pub trait RankingPolicy: fmt::Debug + Send + Sync {
    /// Compares two candidates.
    fn compare(&self, left: &Candidate<'_>, right: &Candidate<'_>) -> Ordering;
}

/// Default policy: prefer agents that are not downgraded, then the lowest
/// known queue depth, then the lowest average response time, then
/// registration order. Unknown values rank after known ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoadedPolicy;

impl RankingPolicy for LeastLoadedPolicy {
    fn compare(&self, left: &Candidate<'_>, right: &Candidate<'_>) -> Ordering {
        left.signal
            .downgraded
            .cmp(&right.signal.downgraded)
            .then_with(|| known_first(left.signal.queue_depth, right.signal.queue_depth))
            .then_with(|| {
                known_first(
                    left.signal.avg_response_time_ms,
                    right.signal.avg_response_time_ms,
                )
            })
            .then_with(|| left.position.cmp(&right.position))
    }
}

fn known_first<T: Ord>(left: Option<T>, right: Option<T>) -> Ordering {
    match (left, right) {
        (Some(left_value), Some(right_value)) => left_value.cmp(&right_value),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
