//! Cached block results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::engine::{ColumnInfo, Row};

/// The last computed output of a block: its schema, a bounded preview and
/// the full row count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockResult {
    /// Output schema.
    pub columns: Vec<ColumnInfo>,
    /// Preview rows, at most the configured preview limit.
    pub rows: Vec<Row>,
    /// Number of rows in the full output.
    pub row_count: u64,
}

impl BlockResult {
    /// Returns whether the preview shows every row of the output.
    pub fn is_complete(&self) -> bool {
        self.rows.len() as u64 >= self.row_count
    }
}

/// Results keyed by block.
///
/// Entries are overwritten by every successful run and survive the owning
/// block becoming stale or failing; they are only dropped with the block.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: HashMap<BlockId, BlockResult>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result of a block.
    pub fn get(&self, id: BlockId) -> Option<&BlockResult> {
        self.results.get(&id)
    }

    /// Caches a result, returning the one it replaced.
    pub fn insert(&mut self, id: BlockId, result: BlockResult) -> Option<BlockResult> {
        self.results.insert(id, result)
    }

    /// Drops the cached result of a block.
    pub fn remove(&mut self, id: BlockId) -> Option<BlockResult> {
        self.results.remove(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.results.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over all cached results.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockResult)> + '_ {
        self.results.iter().map(|(id, result)| (*id, result))
    }
}
