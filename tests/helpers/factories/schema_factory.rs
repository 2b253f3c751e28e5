use crate::engine::types::{ScalarType, Schema};

/// Builds schemas for tests.
pub struct SchemaFactory {
    schema: Schema,
}

impl SchemaFactory {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    pub fn with(mut self, name: &str, typ: ScalarType) -> Self {
        self.schema.insert(name, typ);
        self
    }

    pub fn create(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaFactory {
    fn default() -> Self {
        Self::new()
    }
}
