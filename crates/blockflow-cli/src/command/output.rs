//! Rendering of command results.

use std::fmt::Write;

use blockflow_runtime::prelude::{
    Block, BlockId, BlockResult, BlockStatus, ColumnInfo, CompiledPlan, ExecutionReport, Row,
    Session, TableName,
};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

/// Output format of command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text and tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Schema of an ingested source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSchema {
    pub table: TableName,
    pub columns: Vec<ColumnInfo>,
}

/// A block and its cached result, as printed by `run`.
#[derive(Debug, Serialize)]
struct BlockView<'a> {
    #[serde(flatten)]
    block: &'a Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a BlockResult>,
}

#[derive(Debug, Serialize)]
struct RunView<'a> {
    report: &'a ExecutionReport,
    blocks: Vec<BlockView<'a>>,
}

/// Renders a compiled plan as a SQL script.
pub fn render_plan(session: &Session, plan: &CompiledPlan, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(plan);
    }

    let mut out = String::new();
    for compiled in &plan.blocks {
        let label = block_label(session, compiled.block_id);
        if compiled.sql.is_empty() {
            let _ = writeln!(out, "-- {label}: source table {}\n", compiled.output);
        } else {
            let _ = writeln!(out, "-- {label}\n{};\n", compiled.sql);
        }
    }
    for skipped in &plan.skipped {
        let label = block_label(session, skipped.block_id);
        let _ = writeln!(out, "-- {label}: skipped ({})", skipped.reason);
    }
    out
}

/// Renders every block's status and preview after a run.
pub fn render_run(session: &Session, report: &ExecutionReport, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        let blocks = session
            .blocks()
            .map(|block| BlockView {
                block,
                result: session.result(block.id()),
            })
            .collect();
        return to_json(&RunView { report, blocks });
    }

    let mut out = String::new();
    for block in session.blocks() {
        let _ = writeln!(out, "== {} [{}]", block.label(), status_text(block));
        if let Some(result) = session.result(block.id()) {
            out.push_str(&render_result(result));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} succeeded, {} failed, {} skipped in {:#}",
        report.succeeded().len(),
        report.failed().len(),
        report.skipped().len(),
        report.duration()
    );
    out
}

/// Renders source schemas.
pub fn render_schemas(schemas: &[SourceSchema], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(schemas);
    }

    let mut out = String::new();
    for schema in schemas {
        let _ = writeln!(out, "{}", schema.table);
        for column in &schema.columns {
            let _ = writeln!(out, "  {:<24} {}", column.name, column.semantic_type);
        }
    }
    out
}

fn status_text(block: &Block) -> String {
    let status = match block.status() {
        BlockStatus::Idle => "idle".to_owned(),
        BlockStatus::Running => "running".to_owned(),
        BlockStatus::Success => "success".to_owned(),
        BlockStatus::Error(message) => format!("error: {message}"),
    };

    if block.is_stale() {
        format!("{status}, stale")
    } else {
        status
    }
}

fn block_label(session: &Session, id: BlockId) -> String {
    session
        .block(id)
        .map(|block| block.label().to_owned())
        .unwrap_or_else(|_| id.to_string())
}

/// Renders a result preview as an aligned text table.
fn render_result(result: &BlockResult) -> String {
    let headers: Vec<&str> = result
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| headers.iter().map(|name| cell(row, name)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|name| name.chars().count()).collect();
    for row in &cells {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }

    if !result.is_complete() {
        let _ = writeln!(
            out,
            "({} of {} rows)",
            result.rows.len(),
            result.row_count
        );
    }
    out
}

fn push_line<'a>(out: &mut String, values: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = values
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join(" | ").trim_end());
}

fn cell(row: &Row, name: &str) -> String {
    match row.get(name) {
        None | Some(Value::Null) => "NULL".to_owned(),
        Some(Value::String(text)) => text.clone(),
        Some(value) => value.to_string(),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
}

#[cfg(test)]
mod tests {
    use blockflow_runtime::engine::SemanticType;
    use serde_json::json;

    use super::*;

    fn result(rows: Vec<Value>, row_count: u64) -> BlockResult {
        BlockResult {
            columns: vec![
                ColumnInfo {
                    name: "region".into(),
                    semantic_type: SemanticType::String,
                },
                ColumnInfo {
                    name: "total".into(),
                    semantic_type: SemanticType::Number,
                },
            ],
            rows: rows
                .into_iter()
                .filter_map(|row| row.as_object().cloned())
                .collect(),
            row_count,
        }
    }

    #[test]
    fn renders_aligned_table() {
        let table = render_result(&result(
            vec![
                json!({ "region": "north", "total": 420 }),
                json!({ "region": "south", "total": null }),
            ],
            2,
        ));

        assert_eq!(
            table,
            "region | total\n\
             ------ | -----\n\
             north  | 420\n\
             south  | NULL\n"
        );
    }

    #[test]
    fn notes_truncated_preview() {
        let table = render_result(&result(vec![json!({ "region": "west", "total": 1 })], 40));
        assert!(table.ends_with("(1 of 40 rows)\n"));
    }

    #[test]
    fn renders_schemas() {
        let schemas = vec![SourceSchema {
            table: TableName::from("sales"),
            columns: vec![ColumnInfo {
                name: "amount".into(),
                semantic_type: SemanticType::Number,
            }],
        }];

        let text = render_schemas(&schemas, OutputFormat::Text);
        assert!(text.starts_with("sales\n  amount"));

        let json: Value = serde_json::from_str(&render_schemas(&schemas, OutputFormat::Json))
            .unwrap();
        assert_eq!(json[0]["table"], json!("sales"));
        assert_eq!(json[0]["columns"][0]["name"], json!("amount"));
    }
}
