use std::sync::Arc;

use arrow_array::builder::{
    BooleanBuilder, Float64Builder, Int32Builder, Int64Builder, LargeStringBuilder,
    TimestampMillisecondBuilder,
};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{Field, Schema as ArrowSchema};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{error, warn};

use crate::engine::core::block::Block;
use crate::engine::core::column::{Column, Columns};
use crate::engine::core::merge::{FileNameFn, MergeOutput, Merger};
use crate::engine::errors::MergeError;
use crate::engine::types::{ScalarType, Schema, Value};
use crate::shared::pool::BufferPool;

/// Merges blocks into one snappy-compressed Parquet payload: one row group
/// per block, columns in sorted-name order, absent or mismatched columns
/// padded with nulls.
pub struct ParquetMerger {
    pool: Arc<BufferPool>,
    file_name: Arc<FileNameFn>,
}

impl ParquetMerger {
    pub fn new(pool: Arc<BufferPool>, file_name: Arc<FileNameFn>) -> Self {
        Self { pool, file_name }
    }

    /// Derives the writer schema: one nullable arrow field per column, in
    /// sorted-name order, matching the reader side.
    fn writer_schema(schema: &Schema) -> Result<Arc<ArrowSchema>, MergeError> {
        let fields: Vec<Field> = schema
            .iter()
            .filter(|(_, typ)| **typ != ScalarType::Unsupported)
            .map(|(name, typ)| Field::new(name.as_str(), typ.to_arrow_data_type(), true))
            .collect();
        if fields.is_empty() {
            return Err(MergeError::Schema("schema has no columns".to_string()));
        }
        Ok(Arc::new(ArrowSchema::new(fields)))
    }

    /// Converts one block into a record batch against the target schema,
    /// substituting empty columns wherever the block lacks a compatible one.
    fn block_to_batch(
        block: &Block,
        schema: &Schema,
        arrow_schema: &Arc<ArrowSchema>,
    ) -> Result<RecordBatch, MergeError> {
        let rows = block.select(block.schema());

        let mut columns = Columns::new();
        for (name, typ) in schema.iter() {
            if *typ == ScalarType::Unsupported {
                continue;
            }
            let column = match rows.get(name) {
                Some(column) if column.kind() == *typ => column.clone(),
                _ => Column::new(*typ).expect("supported column type"),
            };
            columns.insert(name.clone(), column);
        }
        columns.fill_nulls();

        let row_count = block.row_count();
        let arrays: Vec<ArrayRef> = arrow_schema
            .fields()
            .iter()
            .map(|field| {
                let column = columns.get(field.name()).expect("column per field");
                column_to_array(column, row_count)
            })
            .collect();

        RecordBatch::try_new(Arc::clone(arrow_schema), arrays)
            .map_err(|e| MergeError::Write(e.to_string()))
    }
}

impl Merger for ParquetMerger {
    fn merge(&self, blocks: &[Block], schema: &Schema) -> Result<MergeOutput, MergeError> {
        if blocks.is_empty() {
            return Err(MergeError::Empty);
        }

        let arrow_schema = Self::writer_schema(schema)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut buffer = self.pool.get();
        let mut writer = ArrowWriter::try_new(&mut buffer, Arc::clone(&arrow_schema), Some(props))
            .map_err(|e| MergeError::Write(e.to_string()))?;

        for block in blocks {
            let batch = match Self::block_to_batch(block, schema, &arrow_schema) {
                Ok(batch) => batch,
                Err(e) => {
                    // A block the writer cannot express is dropped; the rest
                    // of the merge continues.
                    warn!(target: "talaria::merge", error = %e, "Skipping an unmergeable block");
                    continue;
                }
            };
            if let Err(e) = writer.write(&batch) {
                error!(target: "talaria::merge", error = %e, "Unable to write a block");
                continue;
            }
            if let Err(e) = writer.flush() {
                error!(target: "talaria::merge", error = %e, "Unable to flush a row group");
                continue;
            }
        }

        if let Err(e) = writer.close() {
            self.pool.put(buffer);
            return Err(MergeError::Write(e.to_string()));
        }

        let data = buffer.as_slice().to_vec();
        self.pool.put(buffer);

        let name = (self.file_name)(&blocks[0].last_row());
        Ok(MergeOutput { name, data })
    }
}

fn column_to_array(column: &Column, rows: usize) -> ArrayRef {
    match column.kind() {
        ScalarType::String | ScalarType::Json => {
            let mut builder = LargeStringBuilder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::Str(s) => builder.append_value(s),
                    Value::Json(bytes) => {
                        builder.append_value(String::from_utf8_lossy(&bytes));
                    }
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarType::Int32 => {
            let mut builder = Int32Builder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::I32(v) => builder.append_value(v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarType::Int64 => {
            let mut builder = Int64Builder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::I64(v) => builder.append_value(v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarType::Float64 => {
            let mut builder = Float64Builder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::F64(v) => builder.append_value(v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarType::Bool => {
            let mut builder = BooleanBuilder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::Bool(v) => builder.append_value(v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarType::Timestamp => {
            let mut builder = TimestampMillisecondBuilder::new();
            for i in 0..rows {
                match column.value_at(i) {
                    Value::Ts(ts) => builder.append_value(ts.as_millis()),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        // Unsupported columns never materialize; the schema filter upstream
        // drops them before a column is built.
        ScalarType::Unsupported => Arc::new(LargeStringBuilder::new().finish()),
    }
}
