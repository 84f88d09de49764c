//! Given steps for task orchestration BDD scenarios.

use super::world::{OrchestrationWorld, card_document, run_async};
use eyre::WrapErr;
use gropius::agent_client::adapters::memory::AgentBehaviour;
use gropius::agent_registry::domain::AgentId;
use gropius::metrics::domain::{MetricsReport, QueueDepth};
use rstest_bdd_macros::given;

fn register(
    world: &mut OrchestrationWorld,
    agent: String,
    capability: &str,
) -> Result<AgentId, eyre::Report> {
    let document = card_document(&agent, capability);
    let card = run_async(
        world
            .engine
            .orchestrator()
            .registry()
            .register_document(&document),
    )
    .wrap_err("register agent card in scenario setup")?;
    world.documents.push((agent, document));
    Ok(card.agent_id().clone())
}

#[given(r#"an agent "{agent}" offering "{capability}""#)]
fn agent_offering(
    world: &mut OrchestrationWorld,
    agent: String,
    capability: String,
) -> Result<(), eyre::Report> {
    register(world, agent, &capability)?;
    Ok(())
}

#[given(r#"an unreachable agent "{agent}" offering "{capability}""#)]
fn unreachable_agent_offering(
    world: &mut OrchestrationWorld,
    agent: String,
    capability: String,
) -> Result<(), eyre::Report> {
    let agent_id = register(world, agent, &capability)?;
    world
        .transport
        .set_behaviour(&agent_id, AgentBehaviour::Unavailable);
    Ok(())
}

#[given(r#"agent "{agent}" reports a queue depth of {depth:u32}"#)]
fn agent_reports_queue_depth(
    world: &mut OrchestrationWorld,
    agent: String,
    depth: u32,
) -> Result<(), eyre::Report> {
    let agent_id =
        AgentId::new(agent).map_err(|err| eyre::eyre!("invalid agent id in scenario: {err}"))?;
    world.metrics.set_report(
        &agent_id,
        MetricsReport {
            queue_depth: QueueDepth::Known(depth),
            ..MetricsReport::default()
        },
    );
    Ok(())
}

#[given(r#"the resolution of "{capability}" has been recorded"#)]
fn resolution_recorded(
    world: &mut OrchestrationWorld,
    capability: String,
) -> Result<(), eyre::Report> {
    let resolved = super::then::resolve(world, &capability)?;
    world.recorded_resolution = Some(resolved);
    Ok(())
}
