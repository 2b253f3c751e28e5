use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::core::block::Block;
use crate::engine::core::buffer::BufferStore;
use crate::engine::core::key::Key;
use crate::engine::errors::StoreError;
use crate::engine::types::{Timestamp, Value};
use crate::shared::config::TableConfig;

/// One ingestion table: a named row buffer plus the partition and sort
/// columns that shape its key space. Decoded blocks enter here; the
/// compactor drains the buffer underneath.
pub struct Table {
    name: String,
    hash_by: String,
    sort_by: String,
    ttl: Duration,
    buffer: Arc<BufferStore>,
}

impl Table {
    /// Opens the table's buffer under `base_dir/<name>`.
    pub fn open(name: &str, config: &TableConfig, base_dir: &Path) -> Result<Table, StoreError> {
        let name = config.name.clone().unwrap_or_else(|| name.to_string());
        let buffer = BufferStore::open(&base_dir.join(&name))?;

        info!(
            target: "talaria::table",
            table = %name,
            hash_by = %config.hash_by,
            sort_by = %config.sort_by,
            ttl_secs = config.ttl,
            "Table opened"
        );

        Ok(Table {
            name,
            hash_by: config.hash_by.clone(),
            sort_by: config.sort_by.clone(),
            ttl: Duration::from_secs(config.ttl),
            buffer: Arc::new(buffer),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash_by(&self) -> &str {
        &self.hash_by
    }

    pub fn sort_by(&self) -> &str {
        &self.sort_by
    }

    pub fn buffer(&self) -> Arc<BufferStore> {
        Arc::clone(&self.buffer)
    }

    /// Serializes each block and appends it under a composite key: the
    /// block's partition value hashed, the last row's sort column as the
    /// timestamp (now when absent), and a fresh disambiguator.
    pub fn append_blocks(&self, blocks: &[Block]) -> Result<(), StoreError> {
        for block in blocks {
            let sort_by = block
                .last_row()
                .get(&self.sort_by)
                .and_then(Value::as_timestamp)
                .unwrap_or_else(Timestamp::now);

            let key = Key::new(block.partition(), sort_by.as_nanos());
            let value = block
                .to_bytes()
                .map_err(|e| StoreError::Internal(format!("unable to encode a block: {e}")))?;

            self.buffer.append(key, &value, self.ttl)?;
            debug!(
                target: "talaria::table",
                table = %self.name,
                partition = block.partition(),
                rows = block.row_count(),
                bytes = value.len(),
                "Buffered a block"
            );
        }
        Ok(())
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.buffer.close().await
    }
}
