//! When steps for task orchestration BDD scenarios.

use super::world::{OrchestrationWorld, parse_card, run_async};
use eyre::WrapErr;
use gropius::agent_registry::domain::CapabilityId;
use gropius::task::domain::{NewTask, TaskId, TaskStatusReport};
use rstest_bdd_macros::when;
use serde_json::json;

pub(super) fn task_id(raw: &str) -> Result<TaskId, eyre::Report> {
    TaskId::new(raw).map_err(|err| eyre::eyre!("invalid task id in scenario: {err}"))
}

fn capability_id(raw: &str) -> Result<CapabilityId, eyre::Report> {
    CapabilityId::new(raw).map_err(|err| eyre::eyre!("invalid capability in scenario: {err}"))
}

#[when(r#"task "{task}" is created for "{capability}""#)]
fn task_created(
    world: &mut OrchestrationWorld,
    task: String,
    capability: String,
) -> Result<(), eyre::Report> {
    let new_task = NewTask::new(
        task_id(&task)?,
        capability_id(&capability)?,
        json!({ "query": "renewable energy outlook" }),
    );
    let created = run_async(world.engine.orchestrator().create_task(new_task))
        .wrap_err("create task in scenario")?;
    world.last_creation = Some(Ok(created));
    Ok(())
}

#[when(r#"child task "{task}" of "{parent}" is created for "{capability}""#)]
fn child_task_created(
    world: &mut OrchestrationWorld,
    task: String,
    parent: String,
    capability: String,
) -> Result<(), eyre::Report> {
    let new_task = NewTask::new(
        task_id(&task)?,
        capability_id(&capability)?,
        json!({ "query": "solar capacity" }),
    )
    .with_parent(task_id(&parent)?);
    world.last_creation = Some(run_async(world.engine.orchestrator().create_task(new_task)));
    Ok(())
}

#[when(r#"task "{task}" is delegated"#)]
fn task_delegated(world: &mut OrchestrationWorld, task: String) -> Result<(), eyre::Report> {
    run_async(world.engine.orchestrator().delegate(&task_id(&task)?))
        .wrap_err("delegate task in scenario")?;
    Ok(())
}

#[when(r#"the agent reports task "{task}" completed"#)]
fn agent_reports_completed(
    world: &mut OrchestrationWorld,
    task: String,
) -> Result<(), eyre::Report> {
    let id = task_id(&task)?;
    world.transport.set_status(
        &id,
        TaskStatusReport::completed(json!({ "steps": ["solar capacity"] })),
    );
    run_async(world.engine.orchestrator().track(&id)).wrap_err("track task in scenario")?;
    Ok(())
}

#[when("a metrics cycle runs")]
fn metrics_cycle_runs(world: &mut OrchestrationWorld) -> Result<(), eyre::Report> {
    run_async(world.engine.run_metrics_cycle()).wrap_err("run metrics cycle in scenario")?;
    Ok(())
}

#[when(r#"agent "{agent}" is registered again with the same card"#)]
fn agent_registered_again(
    world: &mut OrchestrationWorld,
    agent: String,
) -> Result<(), eyre::Report> {
    let card = parse_card(world.document_of(&agent)?)?;
    let outcome = run_async(world.engine.orchestrator().registry().register(card))
        .wrap_err("re-register agent card in scenario")?;
    world.last_registration = Some(outcome);
    Ok(())
}
