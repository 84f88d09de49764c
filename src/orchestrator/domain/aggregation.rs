//! Completeness policy for aggregating child results.

use crate::task::domain::{Task, TaskId, TaskStatus};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// When a parent's children are complete enough to aggregate.
///
/// Without a partial threshold a parent waits for every child to reach a
/// terminal status. With a threshold, a parent whose completed share has
/// reached `partial_threshold_percent` becomes eligible once the straggler
/// timeout has elapsed since the threshold was first met. The aggregation
/// timeout bounds the whole wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSettings {
    /// Percentage of children that must be completed for partial
    /// aggregation; `None` requires every child to finish.
    pub partial_threshold_percent: Option<u8>,
    /// Grace period granted to stragglers once the threshold is met.
    pub straggler_timeout: Duration,
    /// Upper bound on the whole aggregation wait.
    pub aggregation_timeout: Duration,
    /// Delay between completeness checks.
    pub poll_interval: Duration,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            partial_threshold_percent: None,
            straggler_timeout: Duration::from_secs(5),
            aggregation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(200),
        }
    }
}

impl AggregationSettings {
    /// Settings accepting a partial result once `percent` of the children
    /// completed and `straggler_timeout` passed.
    #[must_use]
    pub fn partial(percent: u8, straggler_timeout: Duration) -> Self {
        Self {
            partial_threshold_percent: Some(percent.min(100)),
            straggler_timeout,
            ..Self::default()
        }
    }

    /// Returns whether the completed share reaches the partial threshold.
    #[must_use]
    pub fn threshold_met(&self, tally: ChildTally) -> bool {
        self.partial_threshold_percent.is_some_and(|percent| {
            let completed = u64::try_from(tally.completed).unwrap_or(u64::MAX);
            let total = u64::try_from(tally.total).unwrap_or(u64::MAX);
            completed.saturating_mul(100) >= u64::from(percent).saturating_mul(total)
        })
    }

    /// Decides whether to aggregate now.
    ///
    /// `waited` is the time since aggregation started and `straggling` the
    /// time since the threshold was first met, if it was.
    #[must_use]
    pub fn evaluate(
        &self,
        tally: ChildTally,
        waited: Duration,
        straggling: Option<Duration>,
    ) -> AggregationDecision {
        if tally.all_terminal() {
            return AggregationDecision::Ready;
        }
        let threshold_met = self.threshold_met(tally);
        if threshold_met && straggling.is_some_and(|elapsed| elapsed >= self.straggler_timeout) {
            return AggregationDecision::ReadyPartial;
        }
        if waited >= self.aggregation_timeout {
            return if threshold_met {
                AggregationDecision::ReadyPartial
            } else {
                AggregationDecision::TimedOut
            };
        }
        AggregationDecision::Wait
    }
}

/// Outcome of one completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationDecision {
    /// Every child is terminal.
    Ready,
    /// Enough children completed and stragglers are left behind.
    ReadyPartial,
    /// Keep waiting.
    Wait,
    /// The aggregation timeout elapsed below the threshold.
    TimedOut,
}

impl AggregationDecision {
    /// Returns whether aggregation may proceed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::ReadyPartial)
    }
}

/// Status counts over a parent's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildTally {
    /// Known children.
    pub total: usize,
    /// Completed children.
    pub completed: usize,
    /// Failed children.
    pub failed: usize,
}

impl ChildTally {
    /// Counts the statuses of `children`.
    #[must_use]
    pub fn of(children: &[Task]) -> Self {
        children.iter().fold(Self::default(), |mut tally, child| {
            tally.total = tally.total.saturating_add(1);
            match child.status() {
                TaskStatus::Completed => tally.completed = tally.completed.saturating_add(1),
                TaskStatus::Failed => tally.failed = tally.failed.saturating_add(1),
                TaskStatus::Pending | TaskStatus::Running => {}
            }
            tally
        })
    }

    /// Returns the number of children still executing.
    #[must_use]
    pub const fn outstanding(self) -> usize {
        self.total
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }

    /// Returns whether every known child is terminal.
    #[must_use]
    pub const fn all_terminal(self) -> bool {
        self.outstanding() == 0
    }
}

/// Result of one completed child handed to synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Child that produced the result.
    pub task_id: TaskId,
    /// Child result document.
    pub result: Value,
}

/// Child results sealed for synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedContext {
    /// Parent the children belong to.
    pub parent_id: TaskId,
    /// Results of completed children in creation order.
    pub findings: Vec<Finding>,
    /// Children without a result: failed ones and stragglers.
    pub missing: Vec<TaskId>,
    /// Whether aggregation proceeded before every child finished.
    pub partial: bool,
}

impl AggregatedContext {
    /// Seals the current child results.
    ///
    /// Children completing after this call are not part of the context.
    #[must_use]
    pub fn seal(parent_id: TaskId, children: &[Task]) -> Self {
        let mut findings = Vec::new();
        let mut missing = Vec::new();
        for child in children {
            match child.result() {
                Some(result) if child.status() == TaskStatus::Completed => findings.push(Finding {
                    task_id: child.id().clone(),
                    result: result.clone(),
                }),
                _ => missing.push(child.id().clone()),
            }
        }
        let partial = children.iter().any(|child| !child.is_terminal());
        Self {
            parent_id,
            findings,
            missing,
            partial,
        }
    }
}
