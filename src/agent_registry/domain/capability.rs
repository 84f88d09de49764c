//! Capability declarations carried by Agent Cards.

use super::{CapabilityId, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// A named unit of work an agent advertises, with its declared shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    id: CapabilityId,
    #[serde(default)]
    input_schema: SchemaDescriptor,
    #[serde(default)]
    output_schema: SchemaDescriptor,
}

impl Capability {
    /// Creates a capability that accepts and produces any payload.
    #[must_use]
    pub const fn new(id: CapabilityId) -> Self {
        Self {
            id,
            input_schema: SchemaDescriptor::any(),
            output_schema: SchemaDescriptor::any(),
        }
    }

    /// Sets the declared input shape.
    #[must_use]
    pub fn with_input_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.input_schema = schema;
        self
    }

    /// Sets the declared output shape.
    #[must_use]
    pub fn with_output_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.output_schema = schema;
        self
    }

    /// Returns the capability identifier.
    #[must_use]
    pub const fn id(&self) -> &CapabilityId {
        &self.id
    }

    /// Returns the declared input shape.
    #[must_use]
    pub const fn input_schema(&self) -> &SchemaDescriptor {
        &self.input_schema
    }

    /// Returns the declared output shape.
    #[must_use]
    pub const fn output_schema(&self) -> &SchemaDescriptor {
        &self.output_schema
    }
}
