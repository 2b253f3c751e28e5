use std::collections::BTreeMap;
use std::sync::Arc;

use arrow_array::{Array, Float64Array, Int64Array, LargeStringArray, RecordBatch};
use arrow_schema::{Field, Schema as ArrowSchema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::engine::core::block::Block;
use crate::engine::core::column::Columns;
use crate::engine::core::merge::{MergeOutput, Merger, ParquetMerger};
use crate::engine::types::{ScalarType, Schema, Value};
use crate::shared::pool::BufferPool;

fn merger() -> ParquetMerger {
    ParquetMerger::new(
        Arc::new(BufferPool::new(1 << 20)),
        Arc::new(|_: &BTreeMap<String, Value>| "out.parquet".to_string()),
    )
}

fn block_of(rows: &[Vec<(&str, Value, ScalarType)>]) -> Block {
    let mut columns = Columns::new();
    for row in rows {
        for (name, value, typ) in row {
            columns.append(name, value.clone(), *typ);
        }
        columns.fill_nulls();
    }
    Block::from_columns("p", columns)
}

fn full_schema() -> Schema {
    let mut schema = Schema::new();
    schema.insert("col0", ScalarType::String);
    schema.insert("col1", ScalarType::Int64);
    schema.insert("col2", ScalarType::Float64);
    schema.insert("col3", ScalarType::Json);
    schema
}

#[test]
fn merging_two_blocks_equals_one_writer_over_both_rows() {
    let json = br#"[{"column":"a","type":"VARCHAR"}]"#;
    let schema = full_schema();

    let block1 = block_of(&[vec![
        ("col0", Value::Str("foo".into()), ScalarType::String),
        ("col1", Value::I64(5), ScalarType::Int64),
        ("col2", Value::F64(14.6), ScalarType::Float64),
        ("col3", Value::Json(json.to_vec()), ScalarType::Json),
    ]]);
    let block2 = block_of(&[vec![
        ("col0", Value::Str("foofoo".into()), ScalarType::String),
        ("col1", Value::I64(10), ScalarType::Int64),
        ("col2", Value::F64(17.0), ScalarType::Float64),
        ("col3", Value::Json(json.to_vec()), ScalarType::Json),
    ]]);

    let MergeOutput { name, data } = merger().merge(&[block1, block2], &schema).unwrap();
    assert_eq!("out.parquet", name);

    // The same two rows written straight through one writer.
    let arrow_schema = Arc::new(ArrowSchema::new(vec![
        Field::new("col0", ScalarType::String.to_arrow_data_type(), true),
        Field::new("col1", ScalarType::Int64.to_arrow_data_type(), true),
        Field::new("col2", ScalarType::Float64.to_arrow_data_type(), true),
        Field::new("col3", ScalarType::Json.to_arrow_data_type(), true),
    ]));
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut reference = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut reference, Arc::clone(&arrow_schema), Some(props)).unwrap();
    let json_str = String::from_utf8_lossy(json).into_owned();
    for (s, i, f) in [("foo", 5i64, 14.6f64), ("foofoo", 10, 17.0)] {
        let batch = RecordBatch::try_new(
            Arc::clone(&arrow_schema),
            vec![
                Arc::new(LargeStringArray::from(vec![s])),
                Arc::new(Int64Array::from(vec![i])),
                Arc::new(Float64Array::from(vec![f])),
                Arc::new(LargeStringArray::from(vec![json_str.as_str()])),
            ],
        )
        .unwrap();
        writer.write(&batch).unwrap();
        writer.flush().unwrap();
    }
    writer.close().unwrap();

    assert_eq!(reference, data);
}

#[test]
fn merging_against_a_superset_schema_pads_missing_columns_with_nulls() {
    let narrow = block_of(&[vec![
        ("col0", Value::Str("foo".into()), ScalarType::String),
        ("col1", Value::I64(5), ScalarType::Int64),
        ("col2", Value::F64(14.6), ScalarType::Float64),
    ]]);
    let wide = block_of(&[vec![
        ("col0", Value::Str("foofoo".into()), ScalarType::String),
        ("col1", Value::I64(10), ScalarType::Int64),
        ("col2", Value::F64(17.0), ScalarType::Float64),
        ("col3", Value::F64(19.0), ScalarType::Float64),
    ]]);

    let mut superset = Schema::new();
    superset.insert("col0", ScalarType::String);
    superset.insert("col1", ScalarType::Int64);
    superset.insert("col2", ScalarType::Float64);
    superset.insert("col3", ScalarType::Float64);

    let MergeOutput { data, .. } = merger().merge(&[narrow, wide], &superset).unwrap();

    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(data))
        .unwrap()
        .with_batch_size(1)
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
    assert_eq!(2, batches.len());

    let first = &batches[0];
    let col3 = first
        .column_by_name("col3")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(col3.is_null(0));

    let second = &batches[1];
    let col3 = second
        .column_by_name("col3")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(19.0, col3.value(0));
}

#[test]
fn type_mismatched_columns_are_padded_not_coerced() {
    // The block carries col1 as a string; the target schema wants int64.
    let block = block_of(&[vec![
        ("col0", Value::Str("row".into()), ScalarType::String),
        ("col1", Value::Str("not-a-number".into()), ScalarType::String),
    ]]);

    let mut schema = Schema::new();
    schema.insert("col0", ScalarType::String);
    schema.insert("col1", ScalarType::Int64);

    let MergeOutput { data, .. } = merger().merge(&[block], &schema).unwrap();

    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(data))
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
    assert_eq!(1, batches.len());
    let col1 = batches[0]
        .column_by_name("col1")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert!(col1.is_null(0));
}

#[test]
fn merging_nothing_is_an_error() {
    assert!(merger().merge(&[], &full_schema()).is_err());
}

#[test]
fn file_name_uses_the_last_row_of_the_first_block() {
    let merger = ParquetMerger::new(
        Arc::new(BufferPool::new(1 << 20)),
        Arc::new(|row: &BTreeMap<String, Value>| {
            format!("events/{}.parquet", row["col0"].partition_string())
        }),
    );

    let block = block_of(&[vec![("col0", Value::Str("hello".into()), ScalarType::String)]]);
    let mut schema = Schema::new();
    schema.insert("col0", ScalarType::String);

    let out = merger.merge(&[block], &schema).unwrap();
    assert_eq!("events/hello.parquet", out.name);
}
