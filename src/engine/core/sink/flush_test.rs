use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::engine::core::sink::{date_partitioned_name, Appender, DirWriter, FlushSink};
use crate::engine::types::{Timestamp, Value};

#[test]
fn flush_sink_delegates_to_the_writer() {
    let dir = TempDir::new().unwrap();
    let sink = FlushSink::new(Arc::new(DirWriter::new(dir.path()).unwrap()));

    sink.append("merged.parquet", b"columnar", Duration::ZERO)
        .unwrap();
    assert_eq!(
        b"columnar".to_vec(),
        std::fs::read(dir.path().join("merged.parquet")).unwrap()
    );
}

#[test]
fn name_templates_date_partition_and_timestamp() {
    let name_fn = date_partitioned_name("ingested_at", "tenant");

    let mut row = BTreeMap::new();
    // 2021-01-01T00:00:00Z
    row.insert(
        "ingested_at".to_string(),
        Value::Ts(Timestamp::new(1609459200, 0)),
    );
    row.insert("tenant".to_string(), Value::Str("acme".into()));

    assert_eq!(
        "2021-01-01/acme-1609459200000000000.parquet",
        name_fn(&row)
    );
}

#[test]
fn name_falls_back_when_columns_are_missing() {
    let name_fn = date_partitioned_name("ingested_at", "tenant");
    let name = name_fn(&BTreeMap::new());
    assert!(name.ends_with(".parquet"));
    assert!(name.contains("/unknown-"));
}
