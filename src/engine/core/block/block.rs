use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::core::block::Row;
use crate::engine::core::column::{Column, Columns};
use crate::engine::errors::BlockError;
use crate::engine::types::Schema;

/// An immutable column-oriented batch of rows sharing one schema. Blocks are
/// the unit stored in the row buffer and consumed by the merger; once sealed
/// all columns have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    partition: String,
    schema: Schema,
    columns: BTreeMap<String, Column>,
}

impl Block {
    /// Seals a set of columns into a block tagged with its partition value.
    /// Uneven columns are levelled with nulls first.
    pub fn from_columns(partition: impl Into<String>, mut columns: Columns) -> Block {
        columns.fill_nulls();
        let schema = columns.schema();
        Block {
            partition: partition.into(),
            schema,
            columns: columns.into_inner(),
        }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().next().map_or(0, Column::count)
    }

    /// The columns named by the given schema. Requested names absent from
    /// the block are simply not returned; the merger substitutes empties.
    pub fn select(&self, schema: &Schema) -> Columns {
        let mut out = BTreeMap::new();
        for name in schema.columns() {
            if let Some(column) = self.columns.get(name) {
                out.insert(name.to_owned(), column.clone());
            }
        }
        Columns::from_inner(out)
    }

    /// The last value of every column, keyed by name.
    pub fn last_row(&self) -> BTreeMap<String, crate::engine::types::Value> {
        self.columns
            .iter()
            .map(|(name, column)| (name.clone(), column.last()))
            .collect()
    }

    /// Iterates the rows of the block in order.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.row_count()).map(move |index| {
            let mut row = Row::new();
            for (name, column) in &self.columns {
                row.set(name, column.value_at(index));
            }
            row
        })
    }

    /// Serializes the block into its buffered form: a bincode envelope,
    /// lz4-compressed with a length prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BlockError> {
        let encoded =
            bincode::serialize(self).map_err(|e| BlockError::Encode(e.to_string()))?;
        Ok(lz4_flex::block::compress_prepend_size(&encoded))
    }

    /// Exact inverse of `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Block, BlockError> {
        let decoded = lz4_flex::block::decompress_size_prepended(bytes)
            .map_err(|e| BlockError::Decode(e.to_string()))?;
        bincode::deserialize(&decoded).map_err(|e| BlockError::Decode(e.to_string()))
    }
}
