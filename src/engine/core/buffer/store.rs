use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::core::buffer::value_log::{Entry, LogRecord, ValueLog};
use crate::engine::core::key::Key;
use crate::engine::errors::StoreError;
use crate::shared::time::unix_seconds;

const GC_INTERVAL: Duration = Duration::from_secs(60);
const GC_DISCARD_RATIO: f64 = 0.3;

// Tombstone batches are committed in chunks so one oversized delete cannot
// stall the log behind a single flush.
const DELETE_BATCH: usize = 1024;

/// Keyed, TTL-bearing, range-scanned durable store buffering encoded blocks
/// until compaction consumes them. The ordered index lives in memory; every
/// mutation is recorded in the value log first.
pub struct BufferStore {
    inner: Arc<StoreInner>,
    gc_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

struct StoreInner {
    state: Mutex<StoreState>,
    closed: AtomicBool,
}

struct StoreState {
    index: BTreeMap<Key, Entry>,
    log: ValueLog,
}

impl BufferStore {
    /// Opens (or creates) a buffer under the given directory, replaying the
    /// value log, and starts the background GC actor when a runtime is
    /// available.
    pub fn open(dir: &Path) -> Result<BufferStore, StoreError> {
        let (log, index) = ValueLog::open(dir)?;
        info!(target: "talaria::buffer", dir = %dir.display(), entries = index.len(), "Buffer opened");

        let inner = Arc::new(StoreInner {
            state: Mutex::new(StoreState { index, log }),
            closed: AtomicBool::new(false),
        });

        let (shutdown, shutdown_rx) = watch::channel(false);
        let gc_task = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(run_gc(Arc::clone(&inner), shutdown_rx))),
            Err(_) => {
                debug!(target: "talaria::buffer", "No async runtime, GC must be driven manually");
                None
            }
        };

        Ok(BufferStore {
            inner,
            gc_task: Mutex::new(gc_task),
            shutdown,
        })
    }

    /// Adds an entry under a key; the last writer wins. A zero ttl means the
    /// entry never expires.
    pub fn append(&self, key: Key, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let expires_at = match ttl.as_secs() {
            0 => 0,
            secs => unix_seconds() + secs,
        };

        let record = LogRecord::Put {
            key: key.as_bytes().try_into().expect("24-byte key"),
            expires_at,
            value: value.to_vec(),
        };

        let mut state = self.inner.state.lock().unwrap();
        let record_size = state.log.append(&record)?;
        if let Some(previous) = state.index.insert(
            key,
            Entry {
                value: value.to_vec(),
                expires_at,
                record_size,
            },
        ) {
            state.log.note_dead(previous.record_size);
        }
        Ok(())
    }

    /// Calls `f` for every key in `[seek, until]` in lexicographic order.
    /// Iteration stops early when `f` returns true.
    pub fn range<F>(&self, seek: Key, until: Key, mut f: F) -> Result<(), StoreError>
    where
        F: FnMut(&Key, &[u8]) -> bool,
    {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let state = self.inner.state.lock().unwrap();
        for (key, entry) in state.index.range(seek..=until) {
            if f(key, &entry.value) {
                break;
            }
        }
        Ok(())
    }

    /// Removes the given keys. Tombstones are committed in chunks, so a
    /// batch larger than one transaction commits and reopens transparently.
    pub fn delete(&self, keys: &[Key]) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let mut state = self.inner.state.lock().unwrap();
        for chunk in keys.chunks(DELETE_BATCH) {
            for key in chunk {
                let record = LogRecord::Delete {
                    key: key.as_bytes().try_into().expect("24-byte key"),
                };
                let tombstone_size = state
                    .log
                    .append(&record)
                    .map_err(|e| StoreError::Internal(format!("unable to delete: {e}")))?;
                state.log.note_dead(tombstone_size);
                if let Some(previous) = state.index.remove(key) {
                    state.log.note_dead(previous.record_size);
                }
            }
            state
                .log
                .flush()
                .map_err(|e| StoreError::Internal(format!("unable to commit deletes: {e}")))?;
        }
        Ok(())
    }

    /// The number of live entries.
    pub fn len(&self) -> usize {
        self.inner.state.lock().unwrap().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one garbage-collection pass: purges expired entries, then runs
    /// value-log collection until it reports no further reclaim.
    pub fn gc_once(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        gc_pass(&self.inner)
    }

    /// Cancels the GC actor and flushes the log. Idempotent.
    pub async fn close(&self) -> Result<(), StoreError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let _ = self.shutdown.send(true);
        let task = self.gc_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        let mut state = self.inner.state.lock().unwrap();
        state.log.flush()?;
        info!(target: "talaria::buffer", "Buffer closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

async fn run_gc(inner: Arc<StoreInner>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(GC_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if inner.closed.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = gc_pass(&inner) {
                    error!(target: "talaria::buffer", error = %e, "GC pass failed");
                }
            }
            _ = shutdown.changed() => {
                debug!(target: "talaria::buffer", "GC actor stopping");
                break;
            }
        }
    }
}

fn gc_pass(inner: &StoreInner) -> Result<(), StoreError> {
    let mut state = inner.state.lock().unwrap();
    let state = &mut *state;
    let now = unix_seconds();

    // Purge expired entries first so the rewrite below skips them.
    let expired: Vec<Key> = state
        .index
        .iter()
        .filter(|(_, entry)| entry.expires_at != 0 && entry.expires_at <= now)
        .map(|(key, _)| *key)
        .collect();

    for key in &expired {
        let record = LogRecord::Delete {
            key: key.as_bytes().try_into().expect("24-byte key"),
        };
        let tombstone_size = state.log.append(&record)?;
        state.log.note_dead(tombstone_size);
        if let Some(previous) = state.index.remove(key) {
            state.log.note_dead(previous.record_size);
        }
    }
    if !expired.is_empty() {
        state.log.flush()?;
        warn!(target: "talaria::buffer", purged = expired.len(), "Purged expired entries");
    }

    loop {
        if !state.log.gc(GC_DISCARD_RATIO, &mut state.index)? {
            break;
        }
    }
    Ok(())
}
