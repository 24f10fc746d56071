//! The external analytical engine contract.
//!
//! The runtime never embeds a query engine. It compiles statements and
//! sequences calls to an [`AnalyticalEngine`]:
//! - [`AnalyticalEngine::execute`]: runs one SQL statement
//! - [`AnalyticalEngine::register_source_file`]: ingests CSV content as a table
//! - [`AnalyticalEngine::describe_table`]: schema introspection

mod column;

use std::sync::Arc;

use async_trait::async_trait;
pub use column::{ColumnDescription, ColumnInfo, SemanticType};
use thiserror::Error;

use crate::block::TableName;

/// A result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// A fault reported by the engine: malformed SQL, ingestion failure, or any
/// other engine-side error. Displays as the engine's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Creates an engine error from the engine's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the engine's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An embedded analytical engine that executes compiled statements.
///
/// Implementations must not interleave two open queries on the same
/// connection; callers issue statements one at a time and await each.
#[async_trait]
pub trait AnalyticalEngine: Send + Sync {
    /// Executes a single SQL statement and returns the rows it produced.
    async fn execute(&self, sql: &str) -> EngineResult<Vec<Row>>;

    /// Ingests CSV `content` as the source table `name`, replacing any
    /// existing table of that name.
    async fn register_source_file(&self, name: &TableName, content: &str) -> EngineResult<()>;

    /// Returns the columns of a table or view in declaration order.
    async fn describe_table(&self, name: &TableName) -> EngineResult<Vec<ColumnDescription>>;
}

#[async_trait]
impl<T> AnalyticalEngine for Arc<T>
where
    T: AnalyticalEngine + ?Sized,
{
    async fn execute(&self, sql: &str) -> EngineResult<Vec<Row>> {
        (**self).execute(sql).await
    }

    async fn register_source_file(&self, name: &TableName, content: &str) -> EngineResult<()> {
        (**self).register_source_file(name, content).await
    }

    async fn describe_table(&self, name: &TableName) -> EngineResult<Vec<ColumnDescription>> {
        (**self).describe_table(name).await
    }
}
