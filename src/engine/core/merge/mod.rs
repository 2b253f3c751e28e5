pub mod merger;
pub mod parquet;

pub use merger::{FileNameFn, MergeOutput, Merger};
pub use parquet::ParquetMerger;

#[cfg(test)]
mod parquet_test;
