//! In-memory tables.

use blockflow_runtime::engine::{ColumnDescription, Row};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;

/// A table held by [`MockEngine`](super::MockEngine).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockTable {
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescription>,
    /// Rows in insertion order.
    pub rows: Vec<Row>,
}

impl MockTable {
    /// Creates an empty table from `(name, engine type)` pairs.
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnDescription::new(*name, *data_type))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row given as a JSON object. Non-object values are ignored.
    pub fn with_row(mut self, row: Value) -> Self {
        if let Value::Object(row) = row {
            self.rows.push(row);
        }
        self
    }

    /// Parses comma-separated content with a header line.
    ///
    /// Fields may be quoted. Column types are inferred from the values:
    /// `BIGINT` when every value is an integer, `DOUBLE` when every value is
    /// numeric, `BOOLEAN` for `true`/`false`, `VARCHAR` otherwise.
    pub fn from_csv(content: &str) -> Result<Self, String> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let names: Vec<String> = reader
            .headers()
            .map_err(|err| format!("invalid CSV header: {err}"))?
            .iter()
            .map(str::to_owned)
            .collect();
        if names.iter().all(String::is_empty) {
            return Err("CSV content has no header line".into());
        }

        let records: Vec<StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .map_err(|err| format!("invalid CSV record: {err}"))?;

        let types: Vec<&str> = (0..names.len())
            .map(|column| infer_type(records.iter().map(|record| &record[column])))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                names
                    .iter()
                    .zip(record)
                    .zip(&types)
                    .map(|((name, raw), data_type)| (name.clone(), parse_value(raw, data_type)))
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: names
                .iter()
                .zip(&types)
                .map(|(name, data_type)| ColumnDescription::new(name.as_str(), *data_type))
                .collect(),
            rows,
        })
    }
}

fn infer_type<'a>(mut values: impl Iterator<Item = &'a str> + Clone) -> &'static str {
    if values.clone().all(|value| value.parse::<i64>().is_ok()) {
        "BIGINT"
    } else if values.clone().all(|value| value.parse::<f64>().is_ok()) {
        "DOUBLE"
    } else if values.all(|value| matches!(value, "true" | "false")) {
        "BOOLEAN"
    } else {
        "VARCHAR"
    }
}

fn parse_value(raw: &str, data_type: &str) -> Value {
    match data_type {
        "BIGINT" => raw.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        "DOUBLE" => raw.parse::<f64>().map(Value::from).unwrap_or(Value::Null),
        "BOOLEAN" => Value::Bool(raw == "true"),
        _ => Value::String(raw.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_csv_with_inferred_types() {
        let table = MockTable::from_csv("region,sales,price,active\nnorth,10,1.5,true\nsouth,20,2,false\n")
            .unwrap();

        let types: Vec<&str> = table
            .columns
            .iter()
            .map(|column| column.data_type.as_str())
            .collect();
        assert_eq!(types, vec!["VARCHAR", "BIGINT", "DOUBLE", "BOOLEAN"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["sales"], json!(20));
        assert_eq!(table.rows[0]["region"], json!("north"));
    }

    #[test]
    fn parses_quoted_fields() {
        let table =
            MockTable::from_csv("name,amount\n\"Smith, John\",3\n\"smith\",4\n").unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["name"], json!("Smith, John"));
        assert_eq!(table.rows[1]["name"], json!("smith"));
        assert_eq!(table.columns[1], ColumnDescription::new("amount", "BIGINT"));
    }

    #[test]
    fn rejects_ragged_csv() {
        assert!(MockTable::from_csv("a,b\n1\n").is_err());
        assert!(MockTable::from_csv("").is_err());
    }
}
