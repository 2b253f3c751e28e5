use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::core::block::Block;
use crate::engine::core::buffer::BufferStore;
use crate::engine::core::key::Key;
use crate::engine::core::merge::Merger;
use crate::engine::core::sink::Appender;
use crate::engine::errors::CompactorError;
use crate::engine::types::Schema;

/// Periodic actor that drains the row buffer into columnar files: it ranges
/// the buffer in key order, coalesces contiguous runs sharing a partition
/// hash and a mergeable schema, hands each run to the merger via a bounded
/// worker pool, and deletes the consumed keys once the sink acknowledges.
///
/// Must be created inside a tokio runtime; the tick timer and the workers
/// are spawned on it.
pub struct Compactor {
    inner: Arc<CompactorInner>,
    tasks: Mutex<Option<mpsc::Sender<MergeTask>>>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
    worker_tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

struct CompactorInner {
    buffer: Arc<BufferStore>,
    dest: Arc<dyn Appender>,
    merger: Arc<dyn Merger>,
}

/// One unit of merge work: a run of contiguous keys, their decoded blocks
/// and the union schema they agreed on.
struct MergeTask {
    keys: Vec<Key>,
    blocks: Vec<Block>,
    schema: Schema,
    done: oneshot::Sender<bool>,
}

impl Compactor {
    pub fn new(
        buffer: Arc<BufferStore>,
        dest: Arc<dyn Appender>,
        merger: Arc<dyn Merger>,
        interval: Duration,
        concurrency: Option<usize>,
    ) -> Compactor {
        let concurrency = concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

        let inner = Arc::new(CompactorInner {
            buffer,
            dest,
            merger,
        });

        let (tx, rx) = mpsc::channel::<MergeTask>(concurrency);
        let rx = Arc::new(AsyncMutex::new(rx));

        let mut workers = Vec::with_capacity(concurrency);
        for id in 0..concurrency {
            workers.push(tokio::spawn(run_worker(
                Arc::clone(&inner),
                Arc::clone(&rx),
                id,
            )));
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let tick = tokio::spawn(run_timer(
            Arc::clone(&inner),
            tx.clone(),
            interval,
            shutdown_rx,
        ));

        info!(
            target: "talaria::compact",
            concurrency,
            interval_secs = interval.as_secs(),
            "Compactor started"
        );

        Compactor {
            inner,
            tasks: Mutex::new(Some(tx)),
            tick_task: Mutex::new(Some(tick)),
            worker_tasks: Mutex::new(workers),
            shutdown,
            closed: AtomicBool::new(false),
        }
    }

    /// Runs one compaction pass and waits for every merge task it produced.
    pub async fn compact(&self) -> Result<(), CompactorError> {
        let sender = self.tasks.lock().unwrap().clone();
        let Some(sender) = sender else {
            return Err(CompactorError::Closed);
        };
        compact_once(&self.inner, &sender).await
    }

    /// Cancels the periodic tick, drains in-flight merges, then closes the
    /// buffer and the sink, in that order. Idempotent.
    pub async fn close(&self) -> Result<(), CompactorError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let _ = self.shutdown.send(true);
        let tick = self.tick_task.lock().unwrap().take();
        if let Some(tick) = tick {
            let _ = tick.await;
        }

        // Dropping the last sender closes the channel and lets the workers
        // drain whatever is still queued.
        drop(self.tasks.lock().unwrap().take());
        let workers = std::mem::take(&mut *self.worker_tasks.lock().unwrap());
        for worker in workers {
            let _ = worker.await;
        }

        self.inner
            .buffer
            .close()
            .await
            .map_err(|e| CompactorError::Close(e.to_string()))?;
        self.inner
            .dest
            .close()
            .map_err(|e| CompactorError::Close(e.to_string()))?;

        info!(target: "talaria::compact", "Compactor closed");
        Ok(())
    }
}

async fn run_timer(
    inner: Arc<CompactorInner>,
    sender: mpsc::Sender<MergeTask>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = compact_once(&inner, &sender).await {
                    error!(target: "talaria::compact", error = %e, "Compaction tick failed");
                }
            }
            _ = shutdown.changed() => {
                debug!(target: "talaria::compact", "Compaction timer stopping");
                break;
            }
        }
    }
}

async fn compact_once(
    inner: &CompactorInner,
    sender: &mpsc::Sender<MergeTask>,
) -> Result<(), CompactorError> {
    let mut groups: Vec<(Vec<Key>, Vec<Block>, Schema)> = Vec::new();

    let mut keys: Vec<Key> = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut schema = Schema::new();
    let mut hash: Option<u64> = None;

    inner.buffer.range(Key::first(), Key::last(), |k, v| {
        let block = match Block::from_bytes(v) {
            Ok(block) => block,
            Err(e) => {
                // A record that fails to decode is skipped; the scan goes on.
                error!(target: "talaria::compact", error = %e, "Unable to read a buffered block");
                return false;
            }
        };

        let h = Key::hash_of(k.as_bytes());

        // While the hash is unchanged and schemas merge cleanly, accumulate.
        if hash.is_none() || hash == Some(h) {
            if let Some(merged) = schema.union(block.schema()) {
                hash = Some(h);
                schema = merged;
                keys.push(*k);
                blocks.push(block);
                return false;
            }
        }

        // Group break: flush the accumulator and seed the next run with the
        // record that broke it.
        groups.push((
            std::mem::take(&mut keys),
            std::mem::take(&mut blocks),
            std::mem::replace(&mut schema, block.schema().clone()),
        ));
        hash = Some(h);
        keys.push(*k);
        blocks.push(block);
        false
    })?;

    if !blocks.is_empty() {
        groups.push((keys, blocks, schema));
    }
    if groups.is_empty() {
        return Ok(());
    }

    debug!(target: "talaria::compact", groups = groups.len(), "Dispatching merge tasks");

    // Dispatch over the bounded channel (back-pressure lives here), then
    // wait for every task of this tick so consumed keys are gone when the
    // tick completes.
    let mut completions = Vec::with_capacity(groups.len());
    for (keys, blocks, schema) in groups {
        let (done, completion) = oneshot::channel();
        sender
            .send(MergeTask {
                keys,
                blocks,
                schema,
                done,
            })
            .await
            .map_err(|e| CompactorError::Dispatch(e.to_string()))?;
        completions.push(completion);
    }
    for completion in completions {
        let _ = completion.await;
    }
    Ok(())
}

async fn run_worker(
    inner: Arc<CompactorInner>,
    rx: Arc<AsyncMutex<mpsc::Receiver<MergeTask>>>,
    id: usize,
) {
    loop {
        let task = { rx.lock().await.recv().await };
        match task {
            Some(task) => run_merge(&inner, task).await,
            None => {
                debug!(target: "talaria::compact", worker = id, "Merge worker stopping");
                break;
            }
        }
    }
}

async fn run_merge(inner: &CompactorInner, task: MergeTask) {
    let MergeTask {
        keys,
        blocks,
        schema,
        done,
    } = task;

    let output = match inner.merger.merge(&blocks, &schema) {
        Ok(output) => output,
        Err(e) => {
            error!(target: "talaria::compact", error = %e, "Unable to merge a block run");
            let _ = done.send(false);
            return;
        }
    };

    if let Err(e) = inner.dest.append(&output.name, &output.data, Duration::ZERO) {
        // The keys stay in the buffer; the next tick retries this run.
        error!(target: "talaria::compact", error = %e, name = %output.name, "Unable to append to the destination");
        let _ = done.send(false);
        return;
    }

    if let Err(e) = inner.buffer.delete(&keys) {
        error!(target: "talaria::compact", error = %e, "Unable to delete consumed keys");
    }

    debug!(
        target: "talaria::compact",
        name = %output.name,
        keys = keys.len(),
        bytes = output.data.len(),
        "Merged and shipped a block run"
    );
    let _ = done.send(true);
}
