//! Per-kind configuration rules.

use thiserror::Error;

use crate::block::{
    AggregateConfig, AggregateFunc, Block, BlockConfig, ChartConfig, FilterConfig, LoadConfig,
    SortConfig, TableName,
};

/// A block configuration that is not complete enough to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Table name is required")]
    MissingTableName,

    #[error("Table name '{0}' must be a plain identifier")]
    InvalidTableName(String),

    #[error("Column is required")]
    MissingColumn,

    #[error("Value is required")]
    MissingValue,

    #[error("At least one metric is required")]
    MissingMetrics,

    #[error("Column is required for {0} metric")]
    MissingMetricColumn(AggregateFunc),

    #[error("Group by column names must not be empty")]
    EmptyGroupByColumn,

    #[error("X and Y axis are required")]
    MissingAxes,
}

/// Checks that a block's configuration can be compiled.
pub fn validate(block: &Block) -> Result<(), ValidationError> {
    validate_config(block.config())
}

/// Checks that a configuration can be compiled.
pub fn validate_config(config: &BlockConfig) -> Result<(), ValidationError> {
    match config {
        BlockConfig::Load(config) => validate_load(config),
        BlockConfig::Filter(config) => validate_filter(config),
        BlockConfig::Aggregate(config) => validate_aggregate(config),
        BlockConfig::Sort(config) => validate_sort(config),
        BlockConfig::Chart(config) => validate_chart(config),
        BlockConfig::Insight(_) => Ok(()),
    }
}

fn validate_load(config: &LoadConfig) -> Result<(), ValidationError> {
    if config.table_name.is_empty() {
        return Err(ValidationError::MissingTableName);
    }
    if !TableName::new(config.table_name.as_str()).is_plain_identifier() {
        return Err(ValidationError::InvalidTableName(config.table_name.clone()));
    }
    Ok(())
}

fn validate_filter(config: &FilterConfig) -> Result<(), ValidationError> {
    if config.column.is_empty() {
        return Err(ValidationError::MissingColumn);
    }
    match &config.value {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingValue),
    }
}

fn validate_aggregate(config: &AggregateConfig) -> Result<(), ValidationError> {
    if config.metrics.is_empty() {
        return Err(ValidationError::MissingMetrics);
    }
    if config.group_by.iter().any(String::is_empty) {
        return Err(ValidationError::EmptyGroupByColumn);
    }
    if let Some(metric) = config
        .metrics
        .iter()
        .find(|m| m.func != AggregateFunc::Count && m.column.is_empty())
    {
        return Err(ValidationError::MissingMetricColumn(metric.func));
    }
    Ok(())
}

fn validate_sort(config: &SortConfig) -> Result<(), ValidationError> {
    if config.column.is_empty() {
        return Err(ValidationError::MissingColumn);
    }
    Ok(())
}

fn validate_chart(config: &ChartConfig) -> Result<(), ValidationError> {
    if config.x_axis.is_empty() || config.y_axis.is_empty() {
        return Err(ValidationError::MissingAxes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{
        BlockKind, FilterOperator, FilterValue, InsightConfig, Metric, SortDirection,
    };

    #[test]
    fn default_configs() {
        let expect = |kind, expected: Result<(), ValidationError>| {
            assert_eq!(validate_config(&BlockConfig::default_for(kind)), expected);
        };

        expect(BlockKind::Load, Err(ValidationError::MissingTableName));
        expect(BlockKind::Filter, Err(ValidationError::MissingColumn));
        expect(BlockKind::Aggregate, Err(ValidationError::MissingMetrics));
        expect(BlockKind::Sort, Err(ValidationError::MissingColumn));
        expect(BlockKind::Chart, Err(ValidationError::MissingAxes));
        expect(BlockKind::Insight, Ok(()));
    }

    #[test]
    fn load_requires_plain_identifier() {
        let config = BlockConfig::Load(LoadConfig::new("sales data"));
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidTableName("sales data".into()))
        );
        assert!(validate_config(&BlockConfig::Load(LoadConfig::new("sales"))).is_ok());
    }

    #[test]
    fn filter_requires_value() {
        let mut config = FilterConfig {
            column: "amount".into(),
            operator: FilterOperator::Gt,
            value: None,
        };
        assert_eq!(validate_filter(&config), Err(ValidationError::MissingValue));

        config.value = Some(FilterValue::Text(String::new()));
        assert_eq!(validate_filter(&config), Err(ValidationError::MissingValue));

        config.value = Some(FilterValue::from(0i64));
        assert_eq!(validate_filter(&config), Ok(()));
    }

    #[test]
    fn aggregate_rules() {
        let count_only = AggregateConfig {
            group_by: vec![],
            metrics: vec![Metric::new(AggregateFunc::Count, "")],
        };
        assert_eq!(validate_aggregate(&count_only), Ok(()));

        let sum_without_column = AggregateConfig {
            group_by: vec!["region".into()],
            metrics: vec![Metric::new(AggregateFunc::Sum, "")],
        };
        assert_eq!(
            validate_aggregate(&sum_without_column),
            Err(ValidationError::MissingMetricColumn(AggregateFunc::Sum))
        );

        let blank_group = AggregateConfig {
            group_by: vec![String::new()],
            metrics: vec![Metric::new(AggregateFunc::Max, "sales")],
        };
        assert_eq!(
            validate_aggregate(&blank_group),
            Err(ValidationError::EmptyGroupByColumn)
        );
    }

    #[test]
    fn chart_requires_both_axes() {
        let config = ChartConfig {
            x_axis: "month".into(),
            ..Default::default()
        };
        assert_eq!(validate_chart(&config), Err(ValidationError::MissingAxes));
    }

    #[test]
    fn complete_configs_pass() {
        let configs = [
            BlockConfig::Sort(SortConfig::new("date", SortDirection::Desc)),
            BlockConfig::Insight(InsightConfig::default()),
            BlockConfig::Filter(FilterConfig::new("name", FilterOperator::Contains, "o'brien")),
        ];
        for config in &configs {
            assert_eq!(validate_config(config), Ok(()), "{config:?}");
        }
    }

    #[test]
    fn messages() {
        assert_eq!(ValidationError::MissingColumn.to_string(), "Column is required");
        assert_eq!(
            ValidationError::MissingAxes.to_string(),
            "X and Y axis are required"
        );
    }
}
