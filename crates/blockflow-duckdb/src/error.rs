//! DuckDB engine error types.

use std::path::PathBuf;

use blockflow_runtime::engine::EngineError;
use thiserror::Error;

/// Result type for opening and configuring a [`DuckDbEngine`].
///
/// [`DuckDbEngine`]: crate::DuckDbEngine
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while opening a database.
#[derive(Debug, Error)]
pub enum Error {
    /// The database file could not be opened.
    #[error("failed to open database {path}: {source}")]
    Open {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying DuckDB error.
        #[source]
        source: duckdb::Error,
    },

    /// The in-memory database could not be created.
    #[error("failed to create in-memory database: {0}")]
    InMemory(#[source] duckdb::Error),
}

/// Converts a DuckDB error into an engine fault carrying DuckDB's message.
pub(crate) fn engine_error(err: duckdb::Error) -> EngineError {
    EngineError::new(err.to_string())
}
