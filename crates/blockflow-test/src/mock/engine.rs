//! Mock analytical engine for testing.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

use async_trait::async_trait;
use blockflow_runtime::block::TableName;
use blockflow_runtime::engine::{
    AnalyticalEngine, ColumnDescription, EngineError, EngineResult, Row,
};
use regex::Regex;
use serde_json::json;

use super::table::MockTable;

static MATERIALIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^CREATE OR REPLACE (TABLE|VIEW) (\S+) AS SELECT .* FROM (\S+)"#)
        .expect("materialize pattern is valid")
});
static PREVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SELECT \* FROM (\S+) LIMIT (\d+)$").expect("preview pattern is valid")
});
static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^SELECT COUNT\(\*\) AS "?(\w+)"? FROM (\S+)$"#).expect("count pattern is valid")
});
static DROP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DROP (TABLE|VIEW) IF EXISTS (\S+)$").expect("drop pattern is valid")
});

#[derive(Debug, Default)]
struct MockState {
    tables: HashMap<String, MockTable>,
    statements: Vec<String>,
    failures: Vec<(String, String)>,
}

/// In-memory [`AnalyticalEngine`] for testing.
///
/// Holds tables in a map, records every statement passed to
/// [`execute`](AnalyticalEngine::execute), and rejects statements that
/// contain a pattern registered with [`fail_on`](Self::fail_on).
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    /// Creates an engine without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    pub fn with_table(self, name: impl Into<String>, table: MockTable) -> Self {
        self.insert_table(name, table);
        self
    }

    /// Adds or replaces a table.
    pub fn insert_table(&self, name: impl Into<String>, table: MockTable) {
        self.state().tables.insert(name.into(), table);
    }

    /// Rejects every later statement containing `pattern` with `message`.
    pub fn fail_on(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.state().failures.push((pattern.into(), message.into()));
    }

    /// Removes all registered failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Returns a copy of a table.
    pub fn table(&self, name: &str) -> Option<MockTable> {
        self.state().tables.get(name).cloned()
    }

    /// Returns whether a table or view exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.state().tables.contains_key(name)
    }

    /// Returns every statement executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    /// Returns the executed statements that contain `pattern`.
    pub fn statements_matching(&self, pattern: &str) -> Vec<String> {
        self.state()
            .statements
            .iter()
            .filter(|sql| sql.contains(pattern))
            .cloned()
            .collect()
    }

    /// Forgets the recorded statements.
    pub fn clear_statements(&self) {
        self.state().statements.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MockState {
    fn run(&mut self, sql: &str) -> EngineResult<Vec<Row>> {
        self.statements.push(sql.to_owned());

        if let Some((_, message)) = self
            .failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            return Err(EngineError::new(message.clone()));
        }

        if let Some(captures) = MATERIALIZE.captures(sql) {
            let input = self.lookup(&captures[3])?.clone();
            self.tables.insert(unquote(&captures[2]), input);
            return Ok(Vec::new());
        }

        if let Some(captures) = PREVIEW.captures(sql) {
            let limit: usize = captures[2].parse().unwrap_or(usize::MAX);
            let table = self.lookup(&captures[1])?;
            return Ok(table.rows.iter().take(limit).cloned().collect());
        }

        if let Some(captures) = COUNT.captures(sql) {
            let table = self.lookup(&captures[2])?;
            let mut row = Row::new();
            row.insert(captures[1].to_owned(), json!(table.rows.len()));
            return Ok(vec![row]);
        }

        if let Some(captures) = DROP.captures(sql) {
            self.tables.remove(&unquote(&captures[2]));
            return Ok(Vec::new());
        }

        Err(EngineError::new(format!(
            "Parser Error: unsupported statement: {sql}"
        )))
    }

    fn lookup(&self, name: &str) -> EngineResult<&MockTable> {
        self.tables.get(&unquote(name)).ok_or_else(|| {
            EngineError::new(format!(
                "Catalog Error: Table with name {name} does not exist!"
            ))
        })
    }
}

/// Strips the double quotes around a quoted identifier.
fn unquote(name: &str) -> String {
    match name.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => name.to_owned(),
    }
}

#[async_trait]
impl AnalyticalEngine for MockEngine {
    async fn execute(&self, sql: &str) -> EngineResult<Vec<Row>> {
        self.state().run(sql)
    }

    async fn register_source_file(&self, name: &TableName, content: &str) -> EngineResult<()> {
        let table = MockTable::from_csv(content).map_err(EngineError::new)?;
        self.insert_table(name.as_str(), table);
        Ok(())
    }

    async fn describe_table(&self, name: &TableName) -> EngineResult<Vec<ColumnDescription>> {
        Ok(self
            .state()
            .tables
            .get(name.as_str())
            .map(|table| table.columns.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn engine() -> MockEngine {
        MockEngine::new().with_table(
            "t1",
            MockTable::new(&[("amount", "INTEGER")])
                .with_row(json!({ "amount": 1 }))
                .with_row(json!({ "amount": 2 })),
        )
    }

    #[tokio::test]
    async fn materializes_and_previews() {
        let engine = engine();
        engine
            .execute(r#"CREATE OR REPLACE TABLE t2 AS SELECT * FROM t1 WHERE "amount" > 1"#)
            .await
            .unwrap();

        let rows = engine.execute("SELECT * FROM t2 LIMIT 1").await.unwrap();
        assert_eq!(rows.len(), 1);

        let count = engine
            .execute(r#"SELECT COUNT(*) AS "row_count" FROM t2"#)
            .await
            .unwrap();
        assert_eq!(count[0]["row_count"], Value::from(2));
        assert_eq!(engine.statements().len(), 3);
    }

    #[tokio::test]
    async fn missing_input_is_a_catalog_error() {
        let engine = engine();
        let err = engine
            .execute("CREATE OR REPLACE VIEW v AS SELECT * FROM missing")
            .await
            .unwrap_err();

        assert!(err.message().contains("missing"));
        assert!(!engine.has_table("v"));
    }

    #[tokio::test]
    async fn injected_failures() {
        let engine = engine();
        engine.fail_on("LIMIT", "boom");

        let err = engine.execute("SELECT * FROM t1 LIMIT 5").await.unwrap_err();
        assert_eq!(err.message(), "boom");

        engine.clear_failures();
        assert!(engine.execute("SELECT * FROM t1 LIMIT 5").await.is_ok());
    }

    #[tokio::test]
    async fn resolves_quoted_table_names() {
        let engine = MockEngine::new();
        engine
            .register_source_file(&TableName::from("order"), "id\n1\n2\n")
            .await
            .unwrap();

        let sort = r#"CREATE OR REPLACE TABLE temp_b2 AS SELECT * FROM "order" ORDER BY "id" ASC"#;
        engine.execute(sort).await.unwrap();
        let rows = engine.execute(r#"SELECT * FROM "order" LIMIT 1"#).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(engine.has_table("temp_b2"));

        engine.execute(r#"DROP TABLE IF EXISTS "order""#).await.unwrap();
        assert!(!engine.has_table("order"));
    }

    #[tokio::test]
    async fn registers_and_drops() {
        let engine = MockEngine::new();
        let name = TableName::from("sales");
        engine
            .register_source_file(&name, "region,amount\nnorth,3\n")
            .await
            .unwrap();

        let columns = engine.describe_table(&name).await.unwrap();
        assert_eq!(columns[1], ColumnDescription::new("amount", "BIGINT"));

        engine.execute("DROP TABLE IF EXISTS sales").await.unwrap();
        assert!(!engine.has_table("sales"));
        assert!(engine.describe_table(&name).await.unwrap().is_empty());
    }
}
