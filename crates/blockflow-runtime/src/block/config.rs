//! Per-kind block configuration.
//!
//! [`BlockConfig`] is a closed sum type keyed by [`BlockKind`]. The validator
//! and the SQL compiler both match on it exhaustively, so a new block kind
//! cannot silently compile to an empty statement.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Discriminant of a block's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockKind {
    /// Reads a registered source table.
    Load,
    /// Keeps rows matching a single condition.
    Filter,
    /// Groups rows and computes aggregate metrics.
    Aggregate,
    /// Orders rows by a single column.
    Sort,
    /// Pass-through view consumed by a chart.
    Chart,
    /// Pass-through view consumed by an insight panel.
    Insight,
}

impl BlockKind {
    /// Returns whether blocks of this kind are pipeline sources.
    pub const fn is_source(self) -> bool {
        matches!(self, Self::Load)
    }

    /// Returns whether blocks of this kind expose their input as a view
    /// instead of materializing a table.
    pub const fn is_view(self) -> bool {
        matches!(self, Self::Chart | Self::Insight)
    }

    /// Returns the default display label for a new block of this kind.
    pub fn default_label(self) -> String {
        let name: &'static str = self.into();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Block", first.to_ascii_uppercase(), chars.as_str()),
            None => "Block".to_owned(),
        }
    }
}

/// Configuration of a block, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockConfig {
    /// Source block configuration.
    Load(LoadConfig),
    /// Row filter configuration.
    Filter(FilterConfig),
    /// Grouping and aggregation configuration.
    Aggregate(AggregateConfig),
    /// Ordering configuration.
    Sort(SortConfig),
    /// Chart configuration.
    Chart(ChartConfig),
    /// Insight configuration.
    Insight(InsightConfig),
}

impl BlockConfig {
    /// Returns the default configuration for a new block of the given kind.
    pub fn default_for(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Load => Self::Load(LoadConfig::default()),
            BlockKind::Filter => Self::Filter(FilterConfig::default()),
            BlockKind::Aggregate => Self::Aggregate(AggregateConfig::default()),
            BlockKind::Sort => Self::Sort(SortConfig::default()),
            BlockKind::Chart => Self::Chart(ChartConfig::default()),
            BlockKind::Insight => Self::Insight(InsightConfig::default()),
        }
    }

    /// Returns the kind this configuration belongs to.
    pub const fn kind(&self) -> BlockKind {
        match self {
            Self::Load(_) => BlockKind::Load,
            Self::Filter(_) => BlockKind::Filter,
            Self::Aggregate(_) => BlockKind::Aggregate,
            Self::Sort(_) => BlockKind::Sort,
            Self::Chart(_) => BlockKind::Chart,
            Self::Insight(_) => BlockKind::Insight,
        }
    }
}

/// Load block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Name of the file the source table was ingested from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Name of the registered source table.
    #[serde(default)]
    pub table_name: String,
}

impl LoadConfig {
    /// Creates a load configuration for an already registered table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            file_name: None,
            table_name: table_name.into(),
        }
    }
}

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
pub enum FilterOperator {
    #[default]
    #[serde(rename = "=")]
    #[strum(serialize = "=")]
    Eq,
    #[serde(rename = "!=")]
    #[strum(serialize = "!=")]
    NotEq,
    #[serde(rename = ">")]
    #[strum(serialize = ">")]
    Gt,
    #[serde(rename = "<")]
    #[strum(serialize = "<")]
    Lt,
    #[serde(rename = ">=")]
    #[strum(serialize = ">=")]
    GtEq,
    #[serde(rename = "<=")]
    #[strum(serialize = "<=")]
    LtEq,
    /// Substring match, compiled to `LIKE '%value%'`.
    #[serde(rename = "contains")]
    #[strum(serialize = "contains")]
    Contains,
    /// Negated substring match, compiled to `NOT LIKE '%value%'`.
    #[serde(rename = "not contains")]
    #[strum(serialize = "not contains")]
    NotContains,
}

/// Literal compared against a column in a filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FilterValue {
    /// Returns whether the value carries no usable content.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Filter block configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Column the condition applies to.
    #[serde(default)]
    pub column: String,
    /// Comparison operator.
    #[serde(default)]
    pub operator: FilterOperator,
    /// Literal to compare against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

impl FilterConfig {
    /// Creates a complete filter condition.
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: Some(value.into()),
        }
    }
}

/// Aggregate function applied by a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregateFunc {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

/// A single aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Column the function reads. Ignored by `count`.
    #[serde(default)]
    pub column: String,
    /// Aggregate function.
    pub func: AggregateFunc,
    /// Output column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Metric {
    /// Creates a metric without an explicit alias.
    pub fn new(func: AggregateFunc, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            func,
            alias: None,
        }
    }

    /// Sets the output column name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the output column name, `<func>_<column>` unless aliased.
    pub fn output_name(&self) -> String {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias.to_owned(),
            _ if self.column.is_empty() => self.func.to_string(),
            _ => format!("{}_{}", self.func, self.column),
        }
    }
}

/// Aggregate block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Grouping columns; empty for a whole-table aggregate.
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Aggregate expressions.
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Column to order by.
    #[serde(default)]
    pub column: String,
    /// Ordering direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortConfig {
    /// Creates a sort configuration.
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Chart rendering style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
    Scatter,
}

/// Chart block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Rendering style.
    #[serde(default)]
    pub chart_type: ChartType,
    /// Column plotted on the horizontal axis.
    #[serde(default)]
    pub x_axis: String,
    /// Column plotted on the vertical axis.
    #[serde(default)]
    pub y_axis: String,
    /// Optional chart title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Insight block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Free-text context handed to whatever renders the insight.
    #[serde(default)]
    pub context: String,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn default_config_matches_kind() {
        for kind in BlockKind::iter() {
            assert_eq!(BlockConfig::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn default_labels() {
        assert_eq!(BlockKind::Load.default_label(), "Load Block");
        assert_eq!(BlockKind::Aggregate.default_label(), "Aggregate Block");
    }

    #[test]
    fn config_serialization_is_tagged() {
        let config = BlockConfig::Filter(FilterConfig::new("amount", FilterOperator::Gt, 100));
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["type"], "filter");
        assert_eq!(json["operator"], ">");
        assert_eq!(json["value"], 100);

        let parsed: BlockConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn filter_value_untagged_parsing() {
        let text: FilterValue = serde_json::from_str("\"o'brien\"").unwrap();
        let number: FilterValue = serde_json::from_str("2.5").unwrap();
        let flag: FilterValue = serde_json::from_str("true").unwrap();

        assert_eq!(text, FilterValue::Text("o'brien".into()));
        assert!(matches!(number, FilterValue::Number(_)));
        assert_eq!(flag, FilterValue::Bool(true));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let json = serde_json::json!({ "type": "filter", "column": "a", "operator": "~", "value": 1 });
        assert!(serde_json::from_value::<BlockConfig>(json).is_err());
    }

    #[test]
    fn metric_output_name() {
        assert_eq!(Metric::new(AggregateFunc::Sum, "sales").output_name(), "sum_sales");
        assert_eq!(
            Metric::new(AggregateFunc::Sum, "sales")
                .with_alias("total")
                .output_name(),
            "total"
        );
        assert_eq!(Metric::new(AggregateFunc::Count, "").output_name(), "count");
    }
}
