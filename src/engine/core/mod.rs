pub mod block;
pub mod buffer;
pub mod column;
pub mod compact;
pub mod ingest;
pub mod key;
pub mod merge;
pub mod sink;

pub use block::{Block, Computed, Row};
pub use buffer::BufferStore;
pub use column::{Column, ColumnPage, Columns};
pub use compact::Compactor;
pub use ingest::{Decoder, IngestPayload};
pub use key::Key;
pub use merge::{MergeOutput, Merger, ParquetMerger};
pub use sink::{Appender, DirWriter, FlushSink, MultiWriter, Writer};
