//! Answers one query through a fleet of registered agents.
//!
//! Usage:
//!
//! ```text
//! gropius --card planner.json --card researcher.json --card synthesizer.json \
//!     [--config engine.toml | --profile local] "renewable energy outlook"
//! ```
//!
//! Each `--card` file holds one Agent Card JSON document. Metrics are
//! collected in the background for as long as the query runs. The answer
//! is written to stdout as JSON; logs go to stderr and honour `RUST_LOG`.

use clap::{Parser, ValueEnum};
use gropius::config::{ConfigError, EngineConfig};
use gropius::engine::HttpEngine;
use gropius::task::domain::TaskId;
use gropius::telemetry::init_tracing;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Built-in configuration presets.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// Library defaults.
    Default,
    /// Short intervals for agents on the local machine.
    Local,
    /// Partial aggregation and a generous retry budget.
    Tolerant,
}

#[derive(Debug, Parser)]
#[command(name = "gropius", version)]
#[command(about = "Answers a query through planner, researcher, and synthesizer agents")]
struct Cli {
    /// TOML configuration file; overrides `--profile`.
    #[arg(long, env = "GROPIUS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Preset used when no configuration file is given.
    #[arg(long, value_enum, default_value_t = Profile::Default)]
    profile: Profile,

    /// Agent Card JSON document to register; repeatable.
    #[arg(long = "card", value_name = "PATH", required = true)]
    cards: Vec<PathBuf>,

    /// Default log directive when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log: String,

    /// Query to answer.
    query: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read agent card {path}")]
    ReadCard {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn load_config(cli: &Cli) -> Result<EngineConfig, CliError> {
    let config = match (&cli.config, cli.profile) {
        (Some(path), _) => EngineConfig::load(path)?,
        (None, Profile::Default) => EngineConfig::default(),
        (None, Profile::Local) => EngineConfig::local(),
        (None, Profile::Tolerant) => EngineConfig::tolerant(),
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    init_tracing(&cli.log)?;

    let config = load_config(&cli)?;
    let engine = HttpEngine::from_config(&config)?;

    for path in &cli.cards {
        let document = std::fs::read_to_string(path).map_err(|source| CliError::ReadCard {
            path: path.clone(),
            source,
        })?;
        let card = engine
            .orchestrator()
            .registry()
            .register_document(&document)
            .await?;
        info!(agent_id = %card.agent_id(), path = %path.display(), "registered agent card");
    }

    let (shutdown, receiver) = watch::channel(false);
    let metrics = engine.spawn_metrics_loop(config.metrics_interval(), receiver);

    let result = engine.orchestrator().run_query(&cli.query).await;

    if shutdown.send(true).is_err() {
        warn!("metrics loop ended before shutdown");
    }
    if let Err(err) = metrics.await {
        warn!(error = %err, "metrics loop did not stop cleanly");
    }

    let outcome = result?;
    let rendered = json!({
        "task_id": outcome.root.id().as_str(),
        "answer": outcome.answer(),
        "partial": outcome.context.partial,
        "missing": outcome
            .context
            .missing
            .iter()
            .map(TaskId::as_str)
            .collect::<Vec<_>>(),
    });
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(&rendered)?)?;
    Ok(())
}
