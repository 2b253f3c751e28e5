use arrow_array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow_schema::{DataType, TimeUnit};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::warn;

use crate::engine::core::block::{Block, Row};
use crate::engine::core::ingest::decoder::{Decoder, Partitioner};
use crate::engine::errors::IngestError;
use crate::engine::types::{Timestamp, Value};

/// Decodes a Parquet payload into partitioned blocks via the arrow
/// record-batch reader.
pub(crate) fn decode(
    decoder: &Decoder,
    payload: &[u8],
    partition_by: &str,
) -> Result<Vec<Block>, IngestError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(payload))
        .map_err(|e| IngestError::Parquet(e.to_string()))?;

    if builder.schema().field_with_name(partition_by).is_err() {
        warn!(
            target: "talaria::ingest",
            partition_by,
            "Partition column absent from the Parquet schema, skipping the payload"
        );
        return Ok(Vec::new());
    }

    let reader = builder
        .build()
        .map_err(|e| IngestError::Parquet(e.to_string()))?;

    let mut partitioner = Partitioner::new(decoder, partition_by);
    for batch in reader {
        let batch = batch.map_err(|e| IngestError::Parquet(e.to_string()))?;
        let schema = batch.schema();

        for row_index in 0..batch.num_rows() {
            let mut row = Row::new();
            for (field, array) in schema.fields().iter().zip(batch.columns()) {
                row.set(field.name(), value_at(array, row_index));
            }
            partitioner.push(row);
        }
    }

    Ok(partitioner.finish())
}

/// Converts one arrow cell into an ingest value; incoming scalars widen to
/// the type universe (float32 to float64), unknown types decode as nulls.
fn value_at(array: &ArrayRef, row: usize) -> Value {
    if array.is_null(row) {
        return Value::Null;
    }

    match array.data_type() {
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| Value::Str(a.value(row).to_string()))
            .unwrap_or(Value::Null),
        DataType::LargeUtf8 => array
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| Value::Str(a.value(row).to_string()))
            .unwrap_or(Value::Null),
        DataType::Int32 => array
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| Value::I32(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Int64 => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| Value::I64(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Float32 => array
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| Value::F64(a.value(row) as f64))
            .unwrap_or(Value::Null),
        DataType::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| Value::F64(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Boolean => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row)))
            .unwrap_or(Value::Null),
        DataType::Timestamp(unit, _) => timestamp_at(array, row, unit),
        _ => Value::Null,
    }
}

fn timestamp_at(array: &ArrayRef, row: usize, unit: &TimeUnit) -> Value {
    let nanos = match unit {
        TimeUnit::Second => array
            .as_any()
            .downcast_ref::<TimestampSecondArray>()
            .map(|a| a.value(row).saturating_mul(1_000_000_000)),
        TimeUnit::Millisecond => array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .map(|a| a.value(row).saturating_mul(1_000_000)),
        TimeUnit::Microsecond => array
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .map(|a| a.value(row).saturating_mul(1_000)),
        TimeUnit::Nanosecond => array
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .map(|a| a.value(row)),
    };
    nanos
        .map(|n| Value::Ts(Timestamp::from_nanos(n)))
        .unwrap_or(Value::Null)
}
