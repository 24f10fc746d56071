//! Column metadata.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// A column as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    /// Engine-native type, e.g. `BIGINT` or `TIMESTAMP WITH TIME ZONE`.
    pub data_type: String,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Simplified column type used by presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SemanticType {
    String,
    Number,
    Date,
    Boolean,
}

impl SemanticType {
    /// Classifies an engine-native type name by substring.
    ///
    /// Numeric patterns are checked before temporal ones, so `INTERVAL` maps
    /// to [`SemanticType::Number`].
    pub fn classify(data_type: &str) -> Self {
        let data_type = data_type.to_ascii_lowercase();
        let contains_any = |patterns: &[&str]| patterns.iter().any(|p| data_type.contains(p));

        if contains_any(&["int", "float", "double", "decimal", "numeric"]) {
            Self::Number
        } else if contains_any(&["date", "time"]) {
            Self::Date
        } else if data_type.contains("bool") {
            Self::Boolean
        } else {
            Self::String
        }
    }
}

/// A column with its simplified type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Simplified type.
    pub semantic_type: SemanticType,
}

impl From<ColumnDescription> for ColumnInfo {
    fn from(column: ColumnDescription) -> Self {
        Self {
            semantic_type: SemanticType::classify(&column.data_type),
            name: column.name,
        }
    }
}
