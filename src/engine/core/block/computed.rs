use crate::engine::core::block::Row;
use crate::engine::types::{ScalarType, Value};

/// A column derived from the row instead of carried by it. Implementations
/// must be pure: the same row always yields the same value.
pub trait Computed: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ScalarType;
    fn apply(&self, row: &Row) -> Value;
}

/// Serializes the entire source row into a single JSON column. Useful when
/// downstream consumers want the raw event next to the extracted columns.
pub struct JsonPayload {
    name: String,
}

impl JsonPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Computed for JsonPayload {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ScalarType {
        ScalarType::Json
    }

    fn apply(&self, row: &Row) -> Value {
        let mut map = serde_json::Map::new();
        for name in row.schema().columns() {
            if let Some(value) = row.get(name) {
                map.insert(name.to_owned(), value.to_json());
            }
        }
        match serde_json::to_vec(&serde_json::Value::Object(map)) {
            Ok(bytes) => Value::Json(bytes),
            Err(_) => Value::Null,
        }
    }
}
