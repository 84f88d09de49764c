//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid
//! configuration. Durations are expressed in milliseconds.
//!
//! ```
//! use gropius::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("[dispatch]\nmax_attempts = 5\n")
//!     .expect("valid configuration");
//! assert_eq!(config.dispatch.max_attempts, 5);
//! assert_eq!(config.pipeline.planner, "analyze-query");
//! ```

use crate::agent_client::services::PollSettings;
use crate::agent_registry::domain::{CapabilityId, RegistryDomainError};
use crate::orchestrator::domain::{
    AggregationSettings, DispatchSettings, OrchestratorSettings, PipelineCapabilities,
    RoutingSettings,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or has unknown fields.
    #[error("invalid configuration document")]
    Parse(#[from] toml::de::Error),

    /// A pipeline capability is not a valid capability id.
    #[error("invalid {stage} capability")]
    InvalidCapability {
        /// Pipeline stage whose capability is invalid.
        stage: &'static str,
        /// Why the identifier was refused.
        #[source]
        source: RegistryDomainError,
    },

    /// The partial aggregation threshold exceeds 100 percent.
    #[error("partial threshold {0}% exceeds 100%")]
    InvalidThreshold(u8),

    /// An interval that drives a loop is zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Delegation attempts and transport timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Timeout for one request to an agent.
    pub request_timeout_ms: u64,
    /// Candidates tried per pass.
    pub max_attempts: u32,
    /// Extra passes after an exhausted first pass.
    pub retry_budget: u32,
    /// Delay before each extra pass.
    pub retry_backoff_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            max_attempts: 3,
            retry_budget: 1,
            retry_backoff_ms: 250,
        }
    }
}

/// Child completeness policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Completed share, in percent, that allows partial aggregation.
    pub partial_threshold_percent: Option<u8>,
    /// Grace period for stragglers once the threshold is met.
    pub straggler_timeout_ms: u64,
    /// Upper bound on the aggregation wait.
    pub aggregation_timeout_ms: u64,
    /// Delay between completeness checks.
    pub poll_interval_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            partial_threshold_percent: None,
            straggler_timeout_ms: 5_000,
            aggregation_timeout_ms: 120_000,
            poll_interval_ms: 200,
        }
    }
}

/// Metrics-driven downgrade thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Queue depth at which an agent is downgraded.
    pub queue_high_water: u32,
    /// How long a downgrade lasts.
    pub cooldown_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            queue_high_water: 10,
            cooldown_ms: 30_000,
        }
    }
}

/// Metrics collection cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Delay between collection cycles.
    pub interval_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_ms: 15_000 }
    }
}

/// Capabilities used by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Planner capability.
    pub planner: String,
    /// Researcher capability.
    pub researcher: String,
    /// Synthesizer capability.
    pub synthesizer: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            planner: "analyze-query".to_owned(),
            researcher: "retrieve-from-documents".to_owned(),
            synthesizer: "synthesize-answer".to_owned(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Delegation attempts and timeouts.
    pub dispatch: DispatchConfig,
    /// Child completeness policy.
    pub aggregation: AggregationConfig,
    /// Downgrade thresholds.
    pub routing: RoutingConfig,
    /// Metrics collection cadence.
    pub metrics: MetricsConfig,
    /// Delay between status polls of a delegated task.
    pub status_poll_interval_ms: u64,
    /// Consecutive failed polls after which an agent is considered lost.
    pub max_consecutive_poll_failures: u32,
    /// Pipeline stage capabilities.
    pub pipeline: PipelineConfig,
    /// Static bearer tokens keyed by audience.
    pub tokens: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            aggregation: AggregationConfig::default(),
            routing: RoutingConfig::default(),
            metrics: MetricsConfig::default(),
            status_poll_interval_ms: 500,
            max_consecutive_poll_failures: 5,
            pipeline: PipelineConfig::default(),
            tokens: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents or the errors
    /// of [`Self::validate`].
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, or the
    /// errors of [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    /// Configuration with short intervals for running against local agents.
    #[must_use]
    pub fn local() -> Self {
        Self {
            dispatch: DispatchConfig {
                request_timeout_ms: 2_000,
                retry_backoff_ms: 50,
                ..DispatchConfig::default()
            },
            aggregation: AggregationConfig {
                aggregation_timeout_ms: 30_000,
                poll_interval_ms: 50,
                ..AggregationConfig::default()
            },
            metrics: MetricsConfig { interval_ms: 2_000 },
            status_poll_interval_ms: 100,
            ..Self::default()
        }
    }

    /// Configuration that answers from partial research when agents lag.
    #[must_use]
    pub fn tolerant() -> Self {
        Self {
            dispatch: DispatchConfig {
                retry_budget: 3,
                retry_backoff_ms: 1_000,
                ..DispatchConfig::default()
            },
            aggregation: AggregationConfig {
                partial_threshold_percent: Some(60),
                straggler_timeout_ms: 10_000,
                ..AggregationConfig::default()
            },
            max_consecutive_poll_failures: 10,
            ..Self::default()
        }
    }

    /// Checks values that cannot be expressed by the types alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`],
    /// [`ConfigError::ZeroInterval`], or [`ConfigError::InvalidCapability`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(percent) = self.aggregation.partial_threshold_percent
            && percent > 100
        {
            return Err(ConfigError::InvalidThreshold(percent));
        }
        let intervals = [
            ("aggregation.poll_interval_ms", self.aggregation.poll_interval_ms),
            ("metrics.interval_ms", self.metrics.interval_ms),
            ("status_poll_interval_ms", self.status_poll_interval_ms),
            ("dispatch.request_timeout_ms", self.dispatch.request_timeout_ms),
        ];
        if let Some((field, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroInterval(*field));
        }
        self.pipeline_capabilities().map(|_| ())
    }

    /// Resolves the pipeline capability ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapability`] naming the first invalid
    /// stage.
    pub fn pipeline_capabilities(&self) -> Result<PipelineCapabilities, ConfigError> {
        Ok(PipelineCapabilities::new(
            capability("planner", &self.pipeline.planner)?,
            capability("researcher", &self.pipeline.researcher)?,
            capability("synthesizer", &self.pipeline.synthesizer)?,
        ))
    }

    /// Builds the orchestrator tunables.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::pipeline_capabilities`].
    pub fn orchestrator_settings(&self) -> Result<OrchestratorSettings, ConfigError> {
        Ok(OrchestratorSettings {
            dispatch: DispatchSettings {
                max_attempts: self.dispatch.max_attempts,
                retry_budget: self.dispatch.retry_budget,
                retry_backoff: Duration::from_millis(self.dispatch.retry_backoff_ms),
            },
            aggregation: AggregationSettings {
                partial_threshold_percent: self.aggregation.partial_threshold_percent,
                straggler_timeout: Duration::from_millis(self.aggregation.straggler_timeout_ms),
                aggregation_timeout: Duration::from_millis(
                    self.aggregation.aggregation_timeout_ms,
                ),
                poll_interval: Duration::from_millis(self.aggregation.poll_interval_ms),
            },
            routing: RoutingSettings {
                queue_high_water: self.routing.queue_high_water,
                cooldown: Duration::from_millis(self.routing.cooldown_ms),
            },
            tracking: self.poll_settings(),
            pipeline: self.pipeline_capabilities()?,
        })
    }

    /// Returns the status polling settings for delegated tasks.
    #[must_use]
    pub const fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.status_poll_interval_ms),
            max_consecutive_failures: self.max_consecutive_poll_failures,
        }
    }

    /// Returns the per-request agent timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.request_timeout_ms)
    }

    /// Returns the delay between metrics cycles.
    #[must_use]
    pub const fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics.interval_ms)
    }
}

fn capability(stage: &'static str, raw: &str) -> Result<CapabilityId, ConfigError> {
    CapabilityId::new(raw).map_err(|source| ConfigError::InvalidCapability { stage, source })
}
