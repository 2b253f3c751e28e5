pub mod csv;
pub mod decoder;
pub mod parquet;

pub use decoder::{Decoder, IngestPayload};
