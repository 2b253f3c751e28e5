use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::engine::core::merge::FileNameFn;
use crate::engine::core::sink::Writer;
use crate::engine::errors::SinkError;
use crate::engine::types::Value;

/// Accepts merged payloads under a name. The compaction destination; the
/// ttl is carried for parity with the buffer contract and ignored by sinks.
pub trait Appender: Send + Sync {
    fn append(&self, name: &str, value: &[u8], ttl: Duration) -> Result<(), SinkError>;

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Adapts a `Writer` into the compaction destination.
pub struct FlushSink {
    writer: Arc<dyn Writer>,
}

impl FlushSink {
    pub fn new(writer: Arc<dyn Writer>) -> Self {
        Self { writer }
    }
}

impl Appender for FlushSink {
    fn append(&self, name: &str, value: &[u8], _ttl: Duration) -> Result<(), SinkError> {
        self.writer.write(name, value)
    }

    fn close(&self) -> Result<(), SinkError> {
        self.writer.close()
    }
}

/// The stock naming scheme for merged files: the sortBy column's calendar
/// date as the directory, the partition value and timestamp as the file.
pub fn date_partitioned_name(sort_by: &str, partition_by: &str) -> Arc<FileNameFn> {
    let sort_by = sort_by.to_owned();
    let partition_by = partition_by.to_owned();

    Arc::new(move |row: &BTreeMap<String, Value>| {
        let nanos = row
            .get(&sort_by)
            .and_then(Value::as_timestamp)
            .unwrap_or_else(crate::engine::types::Timestamp::now)
            .as_nanos();

        let date = Utc
            .timestamp_nanos(nanos)
            .format("%Y-%m-%d")
            .to_string();

        let partition = row
            .get(&partition_by)
            .map(Value::partition_string)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        format!("{date}/{partition}-{nanos}.parquet")
    })
}
