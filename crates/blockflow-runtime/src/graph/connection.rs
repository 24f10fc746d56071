//! Connection type.

use serde::{Deserialize, Serialize};

use crate::block::BlockId;

/// A directed connection feeding `source`'s output into `target`'s input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Upstream block.
    pub source: BlockId,
    /// Downstream block.
    pub target: BlockId,
}

impl Connection {
    /// Creates a new connection.
    pub const fn new(source: BlockId, target: BlockId) -> Self {
        Self { source, target }
    }
}
