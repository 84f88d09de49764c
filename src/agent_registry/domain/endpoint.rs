//! Endpoint templates declared by Agent Cards.

use super::{AgentId, RegistryDomainError};
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the task identifier.
const TASK_ID_PLACEHOLDER: &str = "{task_id}";

/// Placeholder substituted with the agent identifier.
const AGENT_ID_PLACEHOLDER: &str = "{agent_id}";

/// Metrics path used when a card does not declare one.
const DEFAULT_METRICS_TEMPLATE: &str = "/v1/agents/{agent_id}/metrics";

/// Suffix appended to the status URL for cancellation requests.
const CANCEL_SUFFIX: &str = "cancel";

/// Base URL and path templates through which an agent is reached.
///
/// Templates are either paths joined onto the base URL or absolute
/// `http(s)://` URLs used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EndpointsDocument")]
pub struct AgentEndpoints {
    base_url: String,
    task_create: String,
    task_status: String,
    metrics: String,
}

#[derive(Deserialize)]
struct EndpointsDocument {
    base_url: String,
    task_create: String,
    task_status: String,
    #[serde(default)]
    metrics: Option<String>,
}

impl TryFrom<EndpointsDocument> for AgentEndpoints {
    type Error = RegistryDomainError;

    fn try_from(document: EndpointsDocument) -> Result<Self, Self::Error> {
        let endpoints = Self::new(document.base_url, document.task_create, document.task_status)?;
        match document.metrics {
            Some(template) => endpoints.with_metrics(template),
            None => Ok(endpoints),
        }
    }
}

impl AgentEndpoints {
    /// Creates validated endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyBaseUrl`] or
    /// [`RegistryDomainError::InvalidBaseUrl`] for an unusable base URL,
    /// [`RegistryDomainError::EmptyPathTemplate`] for a blank template, and
    /// [`RegistryDomainError::MissingPlaceholder`] when the status template
    /// lacks `{task_id}`.
    pub fn new(
        base_url: impl Into<String>,
        task_create: impl Into<String>,
        task_status: impl Into<String>,
    ) -> Result<Self, RegistryDomainError> {
        let normalized_base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if normalized_base_url.is_empty() {
            return Err(RegistryDomainError::EmptyBaseUrl);
        }
        if !is_http_url(&normalized_base_url) {
            return Err(RegistryDomainError::InvalidBaseUrl(normalized_base_url));
        }

        let task_create = normalize_template(task_create.into(), "task_create")?;
        let task_status = normalize_template(task_status.into(), "task_status")?;
        require_placeholder(&task_status, TASK_ID_PLACEHOLDER)?;

        Ok(Self {
            base_url: normalized_base_url,
            task_create,
            task_status,
            metrics: DEFAULT_METRICS_TEMPLATE.to_owned(),
        })
    }

    /// Replaces the metrics template.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyPathTemplate`] for a blank template
    /// or [`RegistryDomainError::MissingPlaceholder`] when it lacks
    /// `{agent_id}`.
    pub fn with_metrics(
        mut self,
        template: impl Into<String>,
    ) -> Result<Self, RegistryDomainError> {
        let metrics = normalize_template(template.into(), "metrics")?;
        require_placeholder(&metrics, AGENT_ID_PLACEHOLDER)?;
        self.metrics = metrics;
        Ok(self)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the task-creation template as declared.
    #[must_use]
    pub fn task_create(&self) -> &str {
        &self.task_create
    }

    /// Returns the task-status template as declared.
    #[must_use]
    pub fn task_status(&self) -> &str {
        &self.task_status
    }

    /// Returns the metrics template as declared.
    #[must_use]
    pub fn metrics(&self) -> &str {
        &self.metrics
    }

    /// Resolves the task-creation URL.
    #[must_use]
    pub fn task_create_url(&self) -> String {
        self.resolve(&self.task_create)
    }

    /// Resolves the status URL for a task.
    #[must_use]
    pub fn task_status_url(&self, task_id: &str) -> String {
        self.resolve(&self.task_status.replace(TASK_ID_PLACEHOLDER, task_id))
    }

    /// Resolves the cancellation URL for a task.
    #[must_use]
    pub fn task_cancel_url(&self, task_id: &str) -> String {
        format!(
            "{}/{CANCEL_SUFFIX}",
            self.task_status_url(task_id).trim_end_matches('/')
        )
    }

    /// Resolves the metrics URL for an agent.
    #[must_use]
    pub fn metrics_url(&self, agent_id: &AgentId) -> String {
        self.resolve(&self.metrics.replace(AGENT_ID_PLACEHOLDER, agent_id.as_str()))
    }

    fn resolve(&self, path: &str) -> String {
        if is_http_url(path) {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn normalize_template(value: String, name: &str) -> Result<String, RegistryDomainError> {
    let normalized = value.trim().to_owned();
    if normalized.is_empty() {
        return Err(RegistryDomainError::EmptyPathTemplate(name.to_owned()));
    }
    Ok(normalized)
}

fn require_placeholder(template: &str, placeholder: &str) -> Result<(), RegistryDomainError> {
    if template.contains(placeholder) {
        return Ok(());
    }
    Err(RegistryDomainError::MissingPlaceholder {
        template: template.to_owned(),
        placeholder: placeholder.to_owned(),
    })
}
