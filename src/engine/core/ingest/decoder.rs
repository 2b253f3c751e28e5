use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::engine::core::block::{Block, Computed, Row};
use crate::engine::core::column::Columns;
use crate::engine::core::ingest::{csv, parquet};
use crate::engine::errors::IngestError;
use crate::engine::types::{Schema, Value};

/// Accumulated column bytes after which a block is sealed and a new one
/// started.
const MAX_BLOCK_BYTES: usize = 10_000_000;

/// One inbound write request body. The gRPC surface decodes the protobuf
/// envelope; the decoder only sees the payload itself.
pub enum IngestPayload {
    /// Loose rows, one JSON object each.
    Batch(Vec<JsonValue>),
    /// A CSV document with a header row; every column arrives as a string.
    Csv(Vec<u8>),
    /// An encoded Parquet file.
    Parquet(Vec<u8>),
}

/// Parses inbound payloads into partitioned blocks: rows are repartitioned
/// by the partition column, transformed (filter schema + computed columns)
/// and sealed into blocks of bounded size.
pub struct Decoder {
    filter: Option<Schema>,
    computed: Vec<Arc<dyn Computed>>,
    block_capacity: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            filter: None,
            computed: Vec::new(),
            block_capacity: MAX_BLOCK_BYTES,
        }
    }

    /// Restricts and coerces decoded rows to this schema.
    pub fn with_filter(mut self, filter: Schema) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds a computed column evaluated per row.
    pub fn with_computed(mut self, computed: Arc<dyn Computed>) -> Self {
        self.computed.push(computed);
        self
    }

    /// Overrides the sealed-block size bound.
    pub fn with_block_capacity(mut self, bytes: usize) -> Self {
        self.block_capacity = bytes;
        self
    }

    /// Decodes a payload into blocks partitioned by `partition_by`. A
    /// payload that lacks the partition column entirely decodes to nothing;
    /// individual records with an empty partition value are skipped.
    pub fn decode(
        &self,
        payload: IngestPayload,
        partition_by: &str,
    ) -> Result<Vec<Block>, IngestError> {
        match payload {
            IngestPayload::Batch(rows) => self.from_batch(rows, partition_by),
            IngestPayload::Csv(bytes) => csv::decode(self, &bytes, partition_by),
            IngestPayload::Parquet(bytes) => parquet::decode(self, &bytes, partition_by),
        }
    }

    fn from_batch(
        &self,
        rows: Vec<JsonValue>,
        partition_by: &str,
    ) -> Result<Vec<Block>, IngestError> {
        let mut partitioner = Partitioner::new(self, partition_by);

        for entry in rows {
            let JsonValue::Object(map) = entry else {
                return Err(IngestError::Batch("row is not an object".to_string()));
            };

            let mut row = Row::new();
            for (name, value) in map {
                row.set(&name, Value::from_json(value));
            }

            if partitioner.push(row) == Push::MissingColumn {
                warn!(
                    target: "talaria::ingest",
                    partition_by,
                    "Partition column absent, skipping the payload"
                );
                return Ok(Vec::new());
            }
        }

        Ok(partitioner.finish())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Push {
    Appended,
    SkippedRecord,
    MissingColumn,
}

/// Shared repartitioning core: accumulates transformed rows into one column
/// set per partition value and seals them into size-bounded blocks.
pub(crate) struct Partitioner<'a> {
    decoder: &'a Decoder,
    partition_by: &'a str,
    open: BTreeMap<String, Columns>,
    blocks: Vec<Block>,
    size: usize,
}

impl<'a> Partitioner<'a> {
    pub(crate) fn new(decoder: &'a Decoder, partition_by: &'a str) -> Self {
        Self {
            decoder,
            partition_by,
            open: BTreeMap::new(),
            blocks: Vec::new(),
            size: 0,
        }
    }

    pub(crate) fn push(&mut self, row: Row) -> Push {
        let Some(value) = row.get(self.partition_by) else {
            return Push::MissingColumn;
        };
        let partition = value.partition_string();
        if partition.is_empty() {
            return Push::SkippedRecord;
        }

        if self.size >= self.decoder.block_capacity {
            self.seal();
        }

        let filter = self.decoder.filter.as_ref();
        let columns = self.open.entry(partition).or_insert_with(|| match filter {
            Some(filter) => Columns::with_schema(filter),
            None => Columns::new(),
        });

        let out = row.transform(&self.decoder.computed, filter);
        self.size += out.append_to(columns);
        self.size += columns.fill_nulls();
        Push::Appended
    }

    fn seal(&mut self) {
        for (partition, columns) in std::mem::take(&mut self.open) {
            if columns.max() == 0 {
                continue;
            }
            self.blocks.push(Block::from_columns(partition, columns));
        }
        self.size = 0;
    }

    pub(crate) fn finish(mut self) -> Vec<Block> {
        self.seal();
        self.blocks
    }
}
