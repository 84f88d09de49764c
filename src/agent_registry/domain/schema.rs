//! Structural schema descriptors for capability payloads.
//!
//! Descriptors are a tagged shape check, not JSON Schema: the kind of the
//! top-level value and the presence of required object fields. Full payload
//! validation stays with the agent that receives the task.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Top-level JSON kind a payload must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Any JSON value, including `null`.
    Any,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// JSON `null`.
    Null,
}

impl SchemaKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }

    /// Returns the kind of a concrete JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns whether `value` has this kind.
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        self == Self::Any || self == Self::of(value)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape of a capability input or output.
///
/// Deserialises from documents such as
/// `{"type": "object", "required": ["query"]}`; unknown keys (for example
/// `properties`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(alias = "type")]
    kind: SchemaKind,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    required: BTreeSet<String>,
}

impl SchemaDescriptor {
    /// Creates a descriptor that admits every payload.
    #[must_use]
    pub const fn any() -> Self {
        Self::of_kind(SchemaKind::Any)
    }

    /// Creates a descriptor for a kind without required fields.
    #[must_use]
    pub const fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: BTreeSet::new(),
        }
    }

    /// Creates an object descriptor with the given required fields.
    #[must_use]
    pub fn object<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: SchemaKind::Object,
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Returns the required top-level fields.
    #[must_use]
    pub const fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Checks the payload shape against this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatch::KindMismatch`] when the top-level kind
    /// differs, or [`SchemaMismatch::MissingField`] for the first required
    /// field absent from an object payload.
    pub fn check(&self, value: &Value) -> Result<(), SchemaMismatch> {
        if !self.kind.admits(value) {
            return Err(SchemaMismatch::KindMismatch {
                expected: self.kind,
                found: SchemaKind::of(value),
            });
        }

        if let Value::Object(fields) = value
            && let Some(missing) = self
                .required
                .iter()
                .find(|field| !fields.contains_key(field.as_str()))
        {
            return Err(SchemaMismatch::MissingField(missing.clone()));
        }

        Ok(())
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::any()
    }
}

/// Reason a payload failed the structural check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// The payload has the wrong top-level kind.
    #[error("expected {expected} payload, found {found}")]
    KindMismatch {
        /// Kind declared by the schema.
        expected: SchemaKind,
        /// Kind of the submitted payload.
        found: SchemaKind,
    },

    /// A required object field is absent.
    #[error("payload is missing required field '{0}'")]
    MissingField(String),
}
