use crate::engine::core::block::Row;
use crate::engine::types::Value;

/// Builds ingest rows for tests.
pub struct RowFactory {
    values: Vec<(String, Value)>,
}

impl RowFactory {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.values.push((name.to_string(), value));
        self
    }

    pub fn create(self) -> Row {
        let mut row = Row::new();
        for (name, value) in self.values {
            row.set(&name, value);
        }
        row
    }
}

impl Default for RowFactory {
    fn default() -> Self {
        Self::new()
    }
}
