//! DuckDB-backed analytical engine.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use blockflow_runtime::block::TableName;
use blockflow_runtime::compiler::{quote_identifier, quote_literal};
use blockflow_runtime::engine::{
    AnalyticalEngine, ColumnDescription, EngineError, EngineResult, Row,
};
use duckdb::Connection;

use crate::TRACING_TARGET;
use crate::error::{Error, Result, engine_error};
use crate::value::to_json;

/// An embedded DuckDB database implementing [`AnalyticalEngine`].
///
/// Every call clones a fresh connection from the shared handle and runs on
/// Tokio's blocking pool; the handle's lock is held for the whole call, so
/// statements never interleave.
#[derive(Clone)]
pub struct DuckDbEngine {
    connection: Arc<Mutex<Connection>>,
}

impl DuckDbEngine {
    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(Error::InMemory)?;
        tracing::info!(target: TRACING_TARGET, "opened in-memory database");
        Ok(Self::from_connection(connection))
    }

    /// Opens or creates a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(target: TRACING_TARGET, path = %path.display(), "opened database");
        Ok(Self::from_connection(connection))
    }

    /// Wraps an existing connection.
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Runs `task` on the blocking pool with a connection of its own.
    async fn with_connection<T, F>(&self, task: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> EngineResult<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let handle = shared
                .lock()
                .map_err(|_| EngineError::new("database connection lock poisoned"))?;
            let connection = handle.try_clone().map_err(engine_error)?;
            task(&connection)
        })
        .await
        .map_err(|err| EngineError::new(format!("engine task failed: {err}")))?
    }
}

impl std::fmt::Debug for DuckDbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbEngine").finish_non_exhaustive()
    }
}

#[async_trait]
impl AnalyticalEngine for DuckDbEngine {
    async fn execute(&self, sql: &str) -> EngineResult<Vec<Row>> {
        let sql = sql.to_owned();
        self.with_connection(move |connection| {
            let started = Instant::now();
            let rows = if returns_rows(&sql) {
                query(connection, &sql)?
            } else {
                connection.execute_batch(&sql).map_err(engine_error)?;
                Vec::new()
            };

            tracing::debug!(
                target: TRACING_TARGET,
                sql = %sql,
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "statement executed"
            );
            Ok(rows)
        })
        .await
    }

    async fn register_source_file(&self, name: &TableName, content: &str) -> EngineResult<()> {
        let mut file = tempfile::Builder::new()
            .prefix("blockflow-")
            .suffix(".csv")
            .tempfile()
            .map_err(|err| EngineError::new(format!("failed to stage CSV content: {err}")))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| EngineError::new(format!("failed to stage CSV content: {err}")))?;

        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto({})",
            quote_identifier(name.as_str()),
            quote_literal(&file.path().to_string_lossy())
        );
        let table = name.clone();
        let bytes = content.len();

        self.with_connection(move |connection| {
            connection.execute_batch(&sql).map_err(engine_error)?;
            drop(file);

            tracing::info!(target: TRACING_TARGET, %table, bytes, "source registered");
            Ok(())
        })
        .await
    }

    async fn describe_table(&self, name: &TableName) -> EngineResult<Vec<ColumnDescription>> {
        let table = name.as_str().to_owned();
        self.with_connection(move |connection| {
            let mut statement = connection
                .prepare(
                    "SELECT column_name, data_type FROM information_schema.columns \
                     WHERE table_name = ? ORDER BY ordinal_position",
                )
                .map_err(engine_error)?;

            let columns = statement
                .query_map(duckdb::params![table], |row| {
                    Ok(ColumnDescription::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                })
                .map_err(engine_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(engine_error)?;

            Ok(columns)
        })
        .await
    }
}

/// Returns whether a statement produces a result set.
fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    matches!(
        keyword.as_str(),
        "SELECT" | "WITH" | "FROM" | "VALUES" | "SHOW" | "DESCRIBE" | "PRAGMA" | "EXPLAIN"
    )
}

fn query(connection: &Connection, sql: &str) -> EngineResult<Vec<Row>> {
    let mut statement = connection.prepare(sql).map_err(engine_error)?;
    let mut rows = statement.query(duckdb::params![]).map_err(engine_error)?;
    let names = rows
        .as_ref()
        .map(|statement| statement.column_names())
        .unwrap_or_default();

    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(engine_error)? {
        let mut record = Row::new();
        for (index, name) in names.iter().enumerate() {
            let value: duckdb::types::Value = row.get(index).map_err(engine_error)?;
            record.insert(name.clone(), to_json(value));
        }
        collected.push(record);
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_queries() {
        assert!(returns_rows("SELECT * FROM t LIMIT 100"));
        assert!(returns_rows("  with x as (select 1) select * from x"));
        assert!(!returns_rows("CREATE OR REPLACE TABLE t AS SELECT 1"));
        assert!(!returns_rows("DROP VIEW IF EXISTS v"));
        assert!(!returns_rows(""));
    }
}
