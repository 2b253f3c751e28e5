use std::collections::BTreeMap;

use crate::engine::core::block::Block;
use crate::engine::errors::MergeError;
use crate::engine::types::{Schema, Value};

/// Names the merged file from the last row of the first merged block.
pub type FileNameFn = dyn Fn(&BTreeMap<String, Value>) -> String + Send + Sync;

/// The result of a merge: a sink object name and the encoded columnar file.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    pub name: String,
    pub data: Vec<u8>,
}

/// Re-encodes a list of blocks sharing a (possibly heterogeneous) schema
/// into a single columnar payload. Pure with respect to its inputs; the
/// format is an implementation choice behind this trait.
pub trait Merger: Send + Sync {
    fn merge(&self, blocks: &[Block], schema: &Schema) -> Result<MergeOutput, MergeError>;
}
