use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use talaria::engine::core::sink::date_partitioned_name;
use talaria::engine::core::{Compactor, DirWriter, FlushSink, ParquetMerger};
use talaria::engine::table::Table;
use talaria::logging;
use talaria::shared::config::CONFIG;
use talaria::shared::pool::BufferPool;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;
    info!("Starting Talaria");

    let storage_dir = Path::new(&CONFIG.storage.dir);
    let interval = Duration::from_secs(CONFIG.compaction.interval);
    let pool = Arc::new(BufferPool::default());

    let mut compactors = Vec::new();
    for (key, table_config) in &CONFIG.tables {
        let table = Table::open(key, table_config, storage_dir)?;
        let writer =
            DirWriter::new(Path::new(&CONFIG.compaction.output_dir).join(table.name()))?;
        let merger = Arc::new(ParquetMerger::new(
            Arc::clone(&pool),
            date_partitioned_name(table.sort_by(), table.hash_by()),
        ));

        compactors.push(Compactor::new(
            table.buffer(),
            Arc::new(FlushSink::new(Arc::new(writer))),
            merger,
            interval,
            CONFIG.compaction.concurrency,
        ));
    }

    info!(tables = compactors.len(), "Talaria is running");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    for compactor in &compactors {
        compactor.close().await?;
    }
    Ok(())
}
