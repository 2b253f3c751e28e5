use tracing::warn;

use crate::engine::core::block::{Block, Row};
use crate::engine::core::ingest::decoder::{Decoder, Partitioner};
use crate::engine::errors::IngestError;
use crate::engine::types::Value;

/// Decodes a CSV document with a header row. Every field arrives as a
/// string; the decoder's filter schema coerces types where it can.
pub(crate) fn decode(
    decoder: &Decoder,
    payload: &[u8],
    partition_by: &str,
) -> Result<Vec<Block>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(payload);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == partition_by) {
        warn!(
            target: "talaria::ingest",
            partition_by,
            "Partition column absent from the CSV header, skipping the payload"
        );
        return Ok(Vec::new());
    }

    let mut partitioner = Partitioner::new(decoder, partition_by);
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (name, field) in headers.iter().zip(record.iter()) {
            row.set(name, Value::Str(field.to_string()));
        }
        partitioner.push(row);
    }

    Ok(partitioner.finish())
}
