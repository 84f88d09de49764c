//! In-memory integration tests for the query pipeline.

use std::sync::Arc;

use super::helpers::{FAST_CONFIG, Fleet, planner, researcher, synthesizer};
use gropius::agent_client::{adapters::memory::AgentBehaviour, domain::TaskCreateRequest};
use gropius::task::domain::{TaskStatus, TaskStatusReport};
use rstest::rstest;
use serde_json::{Value, json};

const PLANNER: &str = "analyze-query";
const RESEARCHER: &str = "retrieve-from-documents";
const SYNTHESIZER: &str = "synthesize-answer";

async fn fleet(config: &str, research: AgentBehaviour) -> Result<Fleet, eyre::Report> {
    let fleet = Fleet::from_toml(config)?;
    fleet
        .agent(
            "planner-1",
            PLANNER,
            planner(&["solar capacity", "wind capacity", "tidal capacity"]),
        )
        .await?;
    fleet.agent("researcher-1", RESEARCHER, research).await?;
    fleet.agent("synthesizer-1", SYNTHESIZER, synthesizer()).await?;
    Ok(fleet)
}

/// Researcher that handles every step except `tidal capacity` with
/// `answer_tidal`.
fn researcher_struggling_with_tides(answer_tidal: fn() -> TaskStatusReport) -> AgentBehaviour {
    AgentBehaviour::Respond(Arc::new(move |request: &TaskCreateRequest| {
        let query = request.payload.get("query").cloned().unwrap_or(Value::Null);
        if query == json!("tidal capacity") {
            return answer_tidal();
        }
        TaskStatusReport::completed(json!([{ "source": query }]))
    }))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn query_is_answered_from_every_research_step() -> Result<(), eyre::Report> {
    let fleet = fleet(FAST_CONFIG, researcher()).await?;

    let outcome = fleet
        .engine
        .orchestrator()
        .run_query("renewable energy outlook")
        .await?;

    eyre::ensure!(outcome.root.status() == TaskStatus::Completed, "root not completed");
    eyre::ensure!(outcome.research.len() == 3, "expected three research tasks");
    eyre::ensure!(!outcome.context.partial, "context should be complete");
    eyre::ensure!(
        outcome.answer()
            == Some(&json!({
                "sources": ["solar capacity", "wind capacity", "tidal capacity"]
            })),
        "unexpected answer {:?}",
        outcome.answer()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_research_is_reported_missing() -> Result<(), eyre::Report> {
    let fleet = fleet(
        FAST_CONFIG,
        researcher_struggling_with_tides(|| TaskStatusReport::failed("index offline")),
    )
    .await?;

    let outcome = fleet
        .engine
        .orchestrator()
        .run_query("renewable energy outlook")
        .await?;

    let tidal = outcome
        .research
        .iter()
        .find(|task| task.id().as_str().ends_with("-research-3"))
        .ok_or_else(|| eyre::eyre!("missing third research task"))?;
    eyre::ensure!(tidal.status() == TaskStatus::Failed, "tidal research should fail");
    eyre::ensure!(
        outcome.context.missing == vec![tidal.id().clone()],
        "unexpected missing children {:?}",
        outcome.context.missing
    );
    eyre::ensure!(!outcome.context.partial, "every child is terminal");
    eyre::ensure!(
        outcome.answer() == Some(&json!({ "sources": ["solar capacity", "wind capacity"] })),
        "unexpected answer {:?}",
        outcome.answer()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_threshold_leaves_stragglers_behind() -> Result<(), eyre::Report> {
    let config = format!(
        "{FAST_CONFIG}partial_threshold_percent = 60\nstraggler_timeout_ms = 100\n"
    );
    let fleet = fleet(&config, researcher_struggling_with_tides(TaskStatusReport::pending)).await?;

    let outcome = fleet
        .engine
        .orchestrator()
        .run_query("renewable energy outlook")
        .await?;

    eyre::ensure!(outcome.context.partial, "context should be partial");
    eyre::ensure!(outcome.context.findings.len() == 2, "expected two findings");
    eyre::ensure!(
        outcome.synthesis.payload().get("partial") == Some(&json!(true)),
        "synthesizer should be told the context is partial"
    );
    Ok(())
}
