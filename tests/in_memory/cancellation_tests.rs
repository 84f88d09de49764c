//! In-memory integration tests for cancelling task trees.

use super::helpers::{FAST_CONFIG, Fleet};
use gropius::agent_client::adapters::memory::AgentBehaviour;
use gropius::agent_registry::domain::CapabilityId;
use gropius::task::domain::{FailureKind, NewTask, TaskId, TaskStatus};
use rstest::rstest;
use serde_json::json;

fn task_id(raw: &str) -> Result<TaskId, eyre::Report> {
    TaskId::new(raw).map_err(|err| eyre::eyre!("invalid task id: {err}"))
}

fn capability(raw: &str) -> Result<CapabilityId, eyre::Report> {
    CapabilityId::new(raw).map_err(|err| eyre::eyre!("invalid capability: {err}"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_root_cancels_its_running_tree() -> Result<(), eyre::Report> {
    let fleet = Fleet::from_toml(FAST_CONFIG)?;
    fleet
        .agent("planner-1", "analyze-query", AgentBehaviour::Accept)
        .await?;
    fleet
        .agent("researcher-1", "retrieve-from-documents", AgentBehaviour::Accept)
        .await?;
    let orchestrator = fleet.engine.orchestrator();

    let root = task_id("task-root")?;
    let child = task_id("task-root-research-1")?;
    orchestrator
        .create_task(NewTask::new(
            root.clone(),
            capability("analyze-query")?,
            json!({ "query": "renewable energy outlook" }),
        ))
        .await?;
    orchestrator
        .create_task(
            NewTask::new(
                child.clone(),
                capability("retrieve-from-documents")?,
                json!({ "query": "solar capacity" }),
            )
            .with_parent(root.clone()),
        )
        .await?;
    orchestrator.delegate(&root).await?;
    orchestrator.delegate(&child).await?;

    let cancelled = orchestrator.cancel(&root, "operator abort").await?;

    eyre::ensure!(cancelled.status() == TaskStatus::Failed, "root should be failed");
    let stored_child = orchestrator.tasks().get(&child).await?;
    eyre::ensure!(
        stored_child.failure().map(|failure| failure.kind()) == Some(FailureKind::Cancelled),
        "child should be cancelled, found {:?}",
        stored_child.failure()
    );
    let notified: Vec<TaskId> = fleet
        .transport
        .cancellations()
        .into_iter()
        .map(|(_, task)| task)
        .collect();
    eyre::ensure!(
        notified == vec![root, child],
        "unexpected cancellations {notified:?}"
    );
    Ok(())
}
