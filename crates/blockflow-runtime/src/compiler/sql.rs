//! SQL generation.
//!
//! Every function here is pure and total: malformed configurations are
//! rejected earlier by the validator, so nothing in this module queries the
//! engine or fails.

use std::fmt;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::block::{
    AggregateConfig, AggregateFunc, BlockConfig, BlockKind, FilterConfig, FilterOperator,
    FilterValue, Metric, SortConfig, TableName,
};

/// A compiled SQL statement. Empty for blocks that compile to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, From, Into)]
#[serde(transparent)]
pub struct SqlStatement(String);

impl SqlStatement {
    /// The empty statement of pass-through and source blocks.
    pub const fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for SqlStatement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compiles a block configuration into the statement that materializes its
/// output `output` from the upstream table `input`.
///
/// Load blocks are sources and compile to [`SqlStatement::empty`].
pub fn compile(config: &BlockConfig, input: &TableName, output: &TableName) -> SqlStatement {
    let sql = match config {
        BlockConfig::Load(_) => return SqlStatement::empty(),
        BlockConfig::Filter(config) => compile_filter(config, input, output),
        BlockConfig::Aggregate(config) => compile_aggregate(config, input, output),
        BlockConfig::Sort(config) => compile_sort(config, input, output),
        BlockConfig::Chart(_) | BlockConfig::Insight(_) => compile_view(input, output),
    };

    SqlStatement(sql)
}

/// Compiles a bounded read of a table's first rows.
pub fn compile_preview(table: &TableName, limit: usize) -> SqlStatement {
    let table = SqlTable(table);
    SqlStatement(format!("SELECT * FROM {table} LIMIT {limit}"))
}

/// Name of the single column returned by [`compile_count`].
pub const ROW_COUNT_COLUMN: &str = "row_count";

/// Compiles a full row count of a table.
pub fn compile_count(table: &TableName) -> SqlStatement {
    let table = SqlTable(table);
    SqlStatement(format!(
        "SELECT COUNT(*) AS {} FROM {table}",
        quote_identifier(ROW_COUNT_COLUMN)
    ))
}

/// Compiles the removal of a block's derived output.
///
/// Returns the empty statement for source kinds, whose table is owned by
/// whoever ingested it.
pub fn compile_drop(kind: BlockKind, table: &TableName) -> SqlStatement {
    if kind.is_source() {
        return SqlStatement::empty();
    }

    let object = if kind.is_view() { "VIEW" } else { "TABLE" };
    let table = SqlTable(table);
    SqlStatement(format!("DROP {object} IF EXISTS {table}"))
}

/// Wraps an identifier in double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Wraps a string literal in single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn compile_filter(config: &FilterConfig, input: &TableName, output: &TableName) -> String {
    let (input, output) = (SqlTable(input), SqlTable(output));
    let column = quote_identifier(&config.column);
    let condition = match (&config.operator, &config.value) {
        (FilterOperator::Contains, value) => {
            format!("{column} LIKE {}", like_pattern(value.as_ref()))
        }
        (FilterOperator::NotContains, value) => {
            format!("{column} NOT LIKE {}", like_pattern(value.as_ref()))
        }
        (operator, value) => format!("{column} {operator} {}", SqlLiteral(value.as_ref())),
    };

    format!("CREATE OR REPLACE TABLE {output} AS SELECT * FROM {input} WHERE {condition}")
}

fn like_pattern(value: Option<&FilterValue>) -> String {
    let text = value.map(ToString::to_string).unwrap_or_default();
    format!("'%{}%'", escape_literal(&text))
}

fn compile_aggregate(config: &AggregateConfig, input: &TableName, output: &TableName) -> String {
    let (input, output) = (SqlTable(input), SqlTable(output));
    let group_by: Vec<String> = config
        .group_by
        .iter()
        .map(|column| quote_identifier(column))
        .collect();

    let select = group_by
        .iter()
        .cloned()
        .chain(config.metrics.iter().map(metric_expression))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("CREATE OR REPLACE TABLE {output} AS SELECT {select} FROM {input}");
    if !group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by.join(", "));
    }
    sql
}

fn metric_expression(metric: &Metric) -> String {
    let alias = quote_identifier(&metric.output_name());
    match metric.func {
        AggregateFunc::Count => format!("COUNT(*) AS {alias}"),
        func => {
            let name: &'static str = func.into();
            format!(
                "{}({}) AS {alias}",
                name.to_ascii_uppercase(),
                quote_identifier(&metric.column)
            )
        }
    }
}

fn compile_sort(config: &SortConfig, input: &TableName, output: &TableName) -> String {
    let (input, output) = (SqlTable(input), SqlTable(output));
    format!(
        "CREATE OR REPLACE TABLE {output} AS SELECT * FROM {input} ORDER BY {} {}",
        quote_identifier(&config.column),
        config.direction.keyword()
    )
}

fn compile_view(input: &TableName, output: &TableName) -> String {
    let (input, output) = (SqlTable(input), SqlTable(output));
    format!("CREATE OR REPLACE VIEW {output} AS SELECT * FROM {input}")
}

/// Words DuckDB does not accept as a bare table name, sorted.
const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANTI", "ANY", "ARRAY", "AS", "ASC", "ASOF", "ASYMMETRIC",
    "AUTHORIZATION", "BINARY", "BOTH", "CASE", "CAST", "CHECK", "COLLATE", "COLLATION", "COLUMN",
    "CONCURRENTLY", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DEFERRABLE", "DESC", "DESCRIBE",
    "DISTINCT", "DO", "ELSE", "END", "EXCEPT", "FALSE", "FETCH", "FOR", "FOREIGN", "FREEZE", "FROM",
    "FULL", "GENERATED", "GLOB", "GRANT", "GROUP", "HAVING", "ILIKE", "IN", "INITIALLY", "INNER",
    "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT",
    "MAP", "NATURAL", "NOT", "NOTNULL", "NULL", "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER",
    "OVERLAPS", "PIVOT", "PIVOT_LONGER", "PIVOT_WIDER", "PLACING", "POSITIONAL", "PRIMARY",
    "QUALIFY", "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SEMI", "SHOW", "SIMILAR", "SOME",
    "STRUCT", "SUMMARIZE", "SYMMETRIC", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRAILING", "TRUE",
    "TRY_CAST", "UNION", "UNIQUE", "UNPIVOT", "USING", "VARIADIC", "VERBOSE", "WHEN", "WHERE",
    "WINDOW", "WITH",
];

/// Returns whether `name` is a reserved word, ignoring case.
fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Renders a table name, bare when it is a plain identifier that is not a
/// reserved word and double-quoted otherwise.
struct SqlTable<'a>(&'a TableName);

impl fmt::Display for SqlTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.0.as_str();
        if self.0.is_plain_identifier() && !is_reserved_keyword(name) {
            f.write_str(name)
        } else {
            f.write_str(&quote_identifier(name))
        }
    }
}

/// Renders a filter value as a SQL literal.
struct SqlLiteral<'a>(Option<&'a FilterValue>);

impl fmt::Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("NULL"),
            Some(FilterValue::Bool(true)) => f.write_str("TRUE"),
            Some(FilterValue::Bool(false)) => f.write_str("FALSE"),
            Some(FilterValue::Number(number)) => write!(f, "{number}"),
            Some(FilterValue::Text(text)) => f.write_str(&quote_literal(text)),
        }
    }
}
