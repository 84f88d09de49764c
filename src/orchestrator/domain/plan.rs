//! Planner output parsed into research steps.

use serde_json::{Map, Value};
use thiserror::Error;

/// Research steps produced by a planner agent.
///
/// The planner's result is an object holding a `steps` array. Object steps
/// are used as child payloads verbatim; string steps become
/// `{"query": step}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<Value>,
}

/// Reasons a planner result is not a usable plan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The result has no `steps` array.
    #[error("planner result has no 'steps' array")]
    MissingSteps,

    /// The `steps` array is empty.
    #[error("planner produced an empty plan")]
    EmptyPlan,

    /// A step is neither an object nor a string.
    #[error("plan step {index} is neither an object nor a string")]
    InvalidStep {
        /// Zero-based position of the step.
        index: usize,
    },
}

impl Plan {
    /// Parses a planner result.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the result has no non-empty `steps` array
    /// or a step has an unsupported type.
    pub fn from_result(result: &Value) -> Result<Self, PlanError> {
        let raw_steps = result
            .get("steps")
            .and_then(Value::as_array)
            .ok_or(PlanError::MissingSteps)?;
        if raw_steps.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let steps = raw_steps
            .iter()
            .enumerate()
            .map(|(index, step)| match step {
                Value::Object(_) => Ok(step.clone()),
                Value::String(query) => {
                    let mut payload = Map::new();
                    payload.insert("query".to_owned(), Value::String(query.clone()));
                    Ok(Value::Object(payload))
                }
                _ => Err(PlanError::InvalidStep { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// Returns the child payloads in plan order.
    #[must_use]
    pub fn steps(&self) -> &[Value] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns whether the plan has no steps.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
