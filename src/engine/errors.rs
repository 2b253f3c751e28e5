use std::io;
use thiserror::Error;

/// Errors surfaced by the row-buffer store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to run commands on a closed store")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("value encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("corrupt log record: {0}")]
    Corrupt(String),

    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Errors produced while encoding or decoding blocks.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("unable to decode a block: {0}")]
    Decode(String),

    #[error("unable to encode a block: {0}")]
    Encode(String),

    #[error("schemas cannot be merged")]
    SchemaMismatch,
}

/// Errors produced by the columnar merger.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("unable to derive a writer schema: {0}")]
    Schema(String),

    #[error("unable to write columns: {0}")]
    Write(String),

    #[error("merge produced no output")]
    Empty,
}

/// Errors produced by sink writers.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("sink write failed: {0}")]
    Write(String),
}

/// Errors surfaced by the compactor at its boundary. Errors inside a merge
/// task are logged and swallowed so a bad record cannot halt the loop.
#[derive(Debug, Error)]
pub enum CompactorError {
    #[error("unable to run commands on a closed compactor")]
    Closed,

    #[error("range over the buffer failed: {0}")]
    Range(#[from] StoreError),

    #[error("merge task dispatch failed: {0}")]
    Dispatch(String),

    #[error("close failed: {0}")]
    Close(String),
}

/// Errors surfaced by the ingest decoders.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid batch payload: {0}")]
    Batch(String),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet read error: {0}")]
    Parquet(String),
}
