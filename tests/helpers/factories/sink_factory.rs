use std::sync::Mutex;
use std::time::Duration;

use crate::engine::core::sink::Appender;
use crate::engine::errors::SinkError;

/// Collects appended files in memory; the compaction destination in tests.
#[derive(Default)]
pub struct MemorySink {
    writes: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Appender for MemorySink {
    fn append(&self, name: &str, value: &[u8], _ttl: Duration) -> Result<(), SinkError> {
        self.writes
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_vec()));
        Ok(())
    }
}

/// Rejects every append; exercises the keep-keys-on-failure path.
#[derive(Default)]
pub struct FailingSink;

impl FailingSink {
    pub fn new() -> Self {
        Self
    }
}

impl Appender for FailingSink {
    fn append(&self, _name: &str, _value: &[u8], _ttl: Duration) -> Result<(), SinkError> {
        Err(SinkError::Write("sink unavailable".to_string()))
    }
}
