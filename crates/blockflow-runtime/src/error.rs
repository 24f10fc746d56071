//! Runtime error types.

use thiserror::Error;

use crate::block::{BlockId, BlockKind};
use crate::compiler::ValidationError;
use crate::engine::EngineError;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while editing or executing a pipeline.
///
/// During execution every variant except [`Error::BlockNotFound`] is
/// attributed to a single block and surfaced through its status.
#[derive(Debug, Error)]
pub enum Error {
    /// No block with this ID exists in the session.
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    /// A connection would break the graph's structural invariants.
    #[error("invalid connection from {source_id} to {target_id}: {reason}")]
    InvalidConnection {
        /// Upstream block.
        source_id: BlockId,
        /// Downstream block.
        target_id: BlockId,
        /// Why the connection was rejected.
        reason: String,
    },

    /// A configuration edit does not fit the block's kind.
    #[error("invalid config for {kind} block {block_id}: {message}")]
    InvalidConfig {
        /// ID of the edited block.
        block_id: BlockId,
        /// Kind of the edited block.
        kind: BlockKind,
        /// Error message.
        message: String,
    },

    /// The block's configuration is incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A non-source block has no upstream output table to read.
    #[error("No input connected")]
    MissingInput,

    /// The engine rejected a statement or an ingestion.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
