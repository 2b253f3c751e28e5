use crate::engine::core::block::Block;
use crate::engine::core::column::Columns;
use crate::engine::types::{ScalarType, Value};

/// Builds sealed blocks row by row for tests.
pub struct BlockFactory {
    partition: String,
    rows: Vec<Vec<(String, Value, ScalarType)>>,
}

impl BlockFactory {
    pub fn new() -> Self {
        Self {
            partition: "tenant-1".to_string(),
            rows: Vec::new(),
        }
    }

    pub fn with_partition(mut self, partition: &str) -> Self {
        self.partition = partition.to_string();
        self
    }

    pub fn row(mut self, values: &[(&str, Value, ScalarType)]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|(name, value, typ)| (name.to_string(), value.clone(), *typ))
                .collect(),
        );
        self
    }

    pub fn create(self) -> Block {
        let mut columns = Columns::new();
        for row in &self.rows {
            for (name, value, typ) in row {
                columns.append(name, value.clone(), *typ);
            }
            columns.fill_nulls();
        }
        Block::from_columns(self.partition, columns)
    }
}

impl Default for BlockFactory {
    fn default() -> Self {
        Self::new()
    }
}
