//! Then steps for task orchestration BDD scenarios.

use super::when::task_id;
use super::world::{OrchestrationWorld, run_async};
use eyre::WrapErr;
use gropius::agent_registry::domain::{AgentId, CapabilityId, RegistrationOutcome};
use gropius::orchestrator::services::OrchestratorError;
use gropius::task::{
    domain::{StatusUpdate, TaskStatus},
    ports::TaskRepositoryError,
    services::TaskLifecycleError,
};
use rstest_bdd_macros::then;
use serde_json::json;

/// Resolves a capability against the current routing view.
pub(super) fn resolve(
    world: &OrchestrationWorld,
    capability: &str,
) -> Result<Vec<AgentId>, eyre::Report> {
    let capability_id = CapabilityId::new(capability)
        .map_err(|err| eyre::eyre!("invalid capability in scenario: {err}"))?;
    let orchestrator = world.engine.orchestrator();
    let candidates = run_async(
        orchestrator
            .registry()
            .resolve(&capability_id, &orchestrator.routing_view()),
    )
    .wrap_err("resolve capability")?;
    Ok(candidates
        .iter()
        .map(|card| card.agent_id().clone())
        .collect())
}

#[then(r#"task "{task}" is assigned to "{agent}""#)]
fn task_assigned_to(
    world: &OrchestrationWorld,
    task: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let assigned = world
        .engine
        .orchestrator()
        .assignment(&task_id(&task)?)
        .ok_or_else(|| eyre::eyre!("task '{task}' has no assigned agent"))?;
    eyre::ensure!(
        assigned.agent_id().as_str() == agent,
        "expected task '{task}' on '{agent}', found '{}'",
        assigned.agent_id()
    );
    Ok(())
}

#[then(r#"task "{task}" has status "{status}""#)]
fn task_has_status(
    world: &OrchestrationWorld,
    task: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = run_async(world.engine.orchestrator().tasks().get(&task_id(&task)?))
        .wrap_err("load task")?;
    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then(r#"a further update to task "{task}" is refused as a terminal mutation"#)]
fn further_update_refused(world: &OrchestrationWorld, task: String) -> Result<(), eyre::Report> {
    let result = run_async(world.engine.orchestrator().tasks().update_status(
        &task_id(&task)?,
        StatusUpdate::Completed {
            result: json!({ "steps": [] }),
        },
    ));
    match result {
        Err(err) if err.is_terminal_mutation() => Ok(()),
        other => Err(eyre::eyre!(
            "expected a terminal mutation error, got {other:?}"
        )),
    }
}

#[then("creation fails because the parent task is missing")]
fn creation_fails_with_orphan(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_creation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing creation result in scenario world"))?;
    if !matches!(
        result,
        Err(OrchestratorError::Tasks(TaskLifecycleError::Repository(
            TaskRepositoryError::OrphanTask { .. }
        )))
    ) {
        return Err(eyre::eyre!("expected orphan task error, got {result:?}"));
    }
    Ok(())
}

#[then(r#"no task "{task}" is stored"#)]
fn no_task_stored(world: &OrchestrationWorld, task: String) -> Result<(), eyre::Report> {
    let found = run_async(world.engine.orchestrator().tasks().find(&task_id(&task)?))
        .wrap_err("look up task")?;
    eyre::ensure!(found.is_none(), "expected task '{task}' to be absent");
    Ok(())
}

#[then(r#"resolving "{capability}" ranks "{agent}" first"#)]
fn resolution_ranks_first(
    world: &OrchestrationWorld,
    capability: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let resolved = resolve(world, &capability)?;
    let first = resolved
        .first()
        .ok_or_else(|| eyre::eyre!("no candidates for '{capability}'"))?;
    eyre::ensure!(
        first.as_str() == agent,
        "expected '{agent}' first, resolution was {resolved:?}"
    );
    Ok(())
}

#[then("the registration reports the card unchanged")]
fn registration_unchanged(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.last_registration == Some(RegistrationOutcome::Unchanged),
        "expected an unchanged registration, got {:?}",
        world.last_registration
    );
    Ok(())
}

#[then(r#"resolving "{capability}" matches the recorded resolution"#)]
fn resolution_matches_recorded(
    world: &OrchestrationWorld,
    capability: String,
) -> Result<(), eyre::Report> {
    let recorded = world
        .recorded_resolution
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing recorded resolution in scenario world"))?;
    let resolved = resolve(world, &capability)?;
    eyre::ensure!(
        &resolved == recorded,
        "resolution changed from {recorded:?} to {resolved:?}"
    );
    Ok(())
}
