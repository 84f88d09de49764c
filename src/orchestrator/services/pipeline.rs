//! Aggregation and the planner, researcher, synthesizer pipeline.

use super::orchestrator::{Orchestrator, OrchestratorError, OrchestratorResult};
use crate::agent_client::ports::AgentTransport;
use crate::agent_registry::ports::AgentCardRepository;
use crate::orchestrator::domain::{AggregatedContext, AggregationDecision, ChildTally, Plan};
use crate::task::{
    domain::{FailureKind, NewTask, Task, TaskFailure, TaskId, TaskStatus},
    ports::TaskRepository,
};
use mockable::Clock;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Tasks produced by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Root task executed by the planner.
    pub root: Task,
    /// Research children as they stood when the run finished.
    pub research: Vec<Task>,
    /// Synthesis task.
    pub synthesis: Task,
    /// Findings handed to the synthesizer.
    pub context: AggregatedContext,
}

impl QueryOutcome {
    /// Returns the synthesized answer.
    #[must_use]
    pub const fn answer(&self) -> Option<&Value> {
        self.synthesis.result()
    }
}

impl<R, S, T, C> Orchestrator<R, S, T, C>
where
    R: AgentCardRepository + 'static,
    S: TaskRepository + 'static,
    T: AgentTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Waits until a parent's children are complete enough to aggregate
    /// and returns their sealed results.
    ///
    /// Stragglers left behind by a partial aggregation keep running.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AggregationTimedOut`] when the timeout
    /// elapses below the partial threshold, or the store's read errors.
    #[instrument(skip(self))]
    pub async fn aggregate(&self, parent_id: &TaskId) -> OrchestratorResult<AggregatedContext> {
        let policy = self.settings.aggregation;
        let started = Instant::now();
        let mut threshold_met_at: Option<Instant> = None;

        loop {
            let children = self.tasks.collect_children(parent_id).await?;
            let tally = ChildTally::of(&children);
            if threshold_met_at.is_none() && policy.threshold_met(tally) {
                threshold_met_at = Some(Instant::now());
            }

            let decision = policy.evaluate(
                tally,
                started.elapsed(),
                threshold_met_at.map(|met_at| met_at.elapsed()),
            );
            match decision {
                AggregationDecision::Ready | AggregationDecision::ReadyPartial => {
                    debug!(
                        ?decision,
                        completed = tally.completed,
                        total = tally.total,
                        "children ready for aggregation"
                    );
                    return Ok(AggregatedContext::seal(parent_id.clone(), &children));
                }
                AggregationDecision::TimedOut => {
                    warn!(
                        completed = tally.completed,
                        total = tally.total,
                        "aggregation timed out"
                    );
                    return Err(OrchestratorError::AggregationTimedOut {
                        task_id: parent_id.clone(),
                        completed: tally.completed,
                        total: tally.total,
                    });
                }
                AggregationDecision::Wait => tokio::time::sleep(policy.poll_interval).await,
            }
        }
    }

    /// Re-reads the children of a partial context so results stored since
    /// aggregation are included.
    ///
    /// A context without stragglers is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the store's read errors.
    pub async fn refresh_findings(
        &self,
        context: AggregatedContext,
    ) -> OrchestratorResult<AggregatedContext> {
        if !context.partial {
            return Ok(context);
        }
        let before = context.findings.len();
        let children = self.tasks.collect_children(&context.parent_id).await?;
        let refreshed = AggregatedContext::seal(context.parent_id, &children);
        if refreshed.findings.len() > before {
            debug!(
                before,
                after = refreshed.findings.len(),
                "late research results joined the findings"
            );
        }
        Ok(refreshed)
    }

    /// Answers a query with a freshly generated root task identifier.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::run_query_as`].
    pub async fn run_query(&self, query: &str) -> OrchestratorResult<QueryOutcome> {
        self.run_query_as(TaskId::generate(), query).await
    }

    /// Answers a query through the planner, researcher, and synthesizer
    /// stages under the given root task identifier.
    ///
    /// The root task runs the planner. Each plan step becomes a research
    /// child `{root}-research-{n}`, counted from one, executed concurrently.
    /// Once the children are complete enough, the results completed so far
    /// are re-read and sealed into the payload of `{root}-synthesis` as it
    /// is created. Research results arriving after that are still stored
    /// but not synthesized, and following of unfinished children stops when
    /// the run returns.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::TaskFailed`] when the planner or the
    /// synthesizer fails, [`OrchestratorError::InvalidPlan`] for an unusable
    /// plan, and the errors of creation, delegation, and aggregation.
    #[instrument(skip(self, query))]
    pub async fn run_query_as(
        &self,
        root_id: TaskId,
        query: &str,
    ) -> OrchestratorResult<QueryOutcome> {
        let pipeline = self.settings.pipeline.clone();

        let planner_task = self
            .create_task(NewTask::new(
                root_id.clone(),
                pipeline.planner,
                json!({ "query": query }),
            ))
            .await?;
        let root = self.execute(planner_task.id()).await?;
        let plan = Plan::from_result(completed_result(&root)?).map_err(|source| {
            OrchestratorError::InvalidPlan {
                task_id: root_id.clone(),
                source,
            }
        })?;
        info!(steps = plan.len(), "planner produced plan");

        let mut research_ids = Vec::with_capacity(plan.len());
        for (index, step) in plan.steps().iter().enumerate() {
            let child_id = root_id.derive(&format!("research-{}", index.saturating_add(1)))?;
            let child = NewTask::new(child_id, pipeline.researcher.clone(), step.clone())
                .with_parent(root_id.clone());
            research_ids.push(self.create_task(child).await?.id().clone());
        }

        let mut executions = JoinSet::new();
        for child_id in research_ids {
            let orchestrator = self.clone();
            executions.spawn(async move {
                if let Err(err) = orchestrator.execute(&child_id).await {
                    warn!(task_id = %child_id, error = %err, "research task did not complete");
                }
            });
        }

        let aggregated = self.aggregate(&root_id).await?;
        let context = self.refresh_findings(aggregated).await?;
        info!(
            findings = context.findings.len(),
            partial = context.partial,
            "sealed research findings"
        );

        let synthesis_id = root_id.derive("synthesis")?;
        let synthesis_payload = json!({
            "query": query,
            "findings": context.findings,
            "missing": context.missing,
            "partial": context.partial,
        });
        let synthesis_task = self
            .create_task(
                NewTask::new(synthesis_id, pipeline.synthesizer, synthesis_payload)
                    .with_parent(root_id.clone()),
            )
            .await?;
        let synthesis = self.execute(synthesis_task.id()).await?;
        completed_result(&synthesis)?;
        executions.abort_all();

        let research = self
            .tasks
            .collect_children(&root_id)
            .await?
            .into_iter()
            .filter(|child| child.id() != synthesis.id())
            .collect();
        Ok(QueryOutcome {
            root,
            research,
            synthesis,
            context,
        })
    }
}

/// Returns a completed task's result, or the failure that ended it.
fn completed_result(task: &Task) -> OrchestratorResult<&Value> {
    if task.status() == TaskStatus::Completed {
        return Ok(task.result().unwrap_or(&Value::Null));
    }
    let failure = task.failure().cloned().unwrap_or_else(|| {
        TaskFailure::new(
            FailureKind::AgentUnavailable,
            format!("task ended in status {}", task.status()),
        )
    });
    Err(OrchestratorError::TaskFailed {
        task_id: task.id().clone(),
        failure,
    })
}
