//! DuckDB engine against a real in-memory database.

use blockflow_duckdb::DuckDbEngine;
use blockflow_runtime::engine::{AnalyticalEngine, ColumnInfo, SemanticType};
use blockflow_runtime::prelude::*;
use serde_json::json;

const SALES: &str = "\
region,amount,day,returned
north,120,2024-01-01,false
south,80,2024-01-02,true
north,300,2024-01-03,false
west,45,2024-01-04,false
";

async fn engine_with_sales() -> DuckDbEngine {
    let engine = DuckDbEngine::open_in_memory().unwrap();
    engine
        .register_source_file(&TableName::from("sales"), SALES)
        .await
        .unwrap();
    engine
}

#[tokio::test]
async fn ingests_csv_with_inferred_schema() {
    let engine = engine_with_sales().await;

    let columns: Vec<ColumnInfo> = engine
        .describe_table(&TableName::from("sales"))
        .await
        .unwrap()
        .into_iter()
        .map(ColumnInfo::from)
        .collect();

    let schema: Vec<(&str, SemanticType)> = columns
        .iter()
        .map(|column| (column.name.as_str(), column.semantic_type))
        .collect();
    assert_eq!(
        schema,
        vec![
            ("region", SemanticType::String),
            ("amount", SemanticType::Number),
            ("day", SemanticType::Date),
            ("returned", SemanticType::Boolean),
        ]
    );
}

#[tokio::test]
async fn describe_unknown_table_is_empty() {
    let engine = DuckDbEngine::open_in_memory().unwrap();
    let columns = engine
        .describe_table(&TableName::from("missing"))
        .await
        .unwrap();
    assert!(columns.is_empty());
}

#[tokio::test]
async fn query_rows_are_json_objects() {
    let engine = engine_with_sales().await;

    let rows = engine
        .execute(r#"SELECT region, amount, day FROM sales ORDER BY amount DESC LIMIT 1"#)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["region"], json!("north"));
    assert_eq!(rows[0]["amount"], json!(300));
    assert_eq!(rows[0]["day"], json!("2024-01-03"));
}

#[tokio::test]
async fn malformed_sql_reports_engine_message() {
    let engine = engine_with_sales().await;

    let err = engine
        .execute("CREATE OR REPLACE TABLE t AS SELECT * FROM nowhere")
        .await
        .unwrap_err();
    assert!(err.message().contains("nowhere"));
}

#[tokio::test]
async fn runs_a_full_pipeline() {
    let orchestrator = Orchestrator::with_defaults(engine_with_sales().await);
    let mut session = Session::new();

    let load = session.add_block_with_config(BlockConfig::Load(LoadConfig::new("sales")));
    let filter = session.add_block_with_config(BlockConfig::Filter(FilterConfig::new(
        "amount",
        FilterOperator::Gt,
        50,
    )));
    let aggregate = session.add_block_with_config(BlockConfig::Aggregate(AggregateConfig {
        group_by: vec!["region".into()],
        metrics: vec![
            Metric::new(AggregateFunc::Sum, "amount").with_alias("total"),
            Metric::new(AggregateFunc::Count, ""),
        ],
    }));
    let sort = session.add_block_with_config(BlockConfig::Sort(SortConfig::new(
        "total",
        SortDirection::Desc,
    )));
    let chart = session.add_block_with_config(BlockConfig::Chart(ChartConfig {
        chart_type: ChartType::Bar,
        x_axis: "region".into(),
        y_axis: "total".into(),
        title: Some("Sales by region".into()),
    }));
    session.connect(load, filter).unwrap();
    session.connect(filter, aggregate).unwrap();
    session.connect(aggregate, sort).unwrap();
    session.connect(sort, chart).unwrap();

    let report = orchestrator.execute_all(&mut session).await;
    assert!(report.is_success(), "{report:?}");

    let filtered = session.result(filter).unwrap();
    assert_eq!(filtered.row_count, 3);

    let chart_result = session.result(chart).unwrap();
    assert_eq!(chart_result.row_count, 2);
    assert_eq!(chart_result.rows[0]["region"], json!("north"));
    assert_eq!(chart_result.rows[0]["total"], json!(420));
    assert_eq!(chart_result.rows[0]["count"], json!(2));
    assert_eq!(chart_result.rows[1]["total"], json!(80));

    let names: Vec<&str> = chart_result
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    assert_eq!(names, vec!["region", "total", "count"]);
}

#[tokio::test]
async fn contains_filter_escapes_quotes() {
    let engine = DuckDbEngine::open_in_memory().unwrap();
    engine
        .register_source_file(&TableName::from("people"), "name\no'brien\nsmith\n")
        .await
        .unwrap();
    let orchestrator = Orchestrator::with_defaults(engine);

    let mut session = Session::new();
    let load = session.add_block_with_config(BlockConfig::Load(LoadConfig::new("people")));
    let filter = session.add_block_with_config(BlockConfig::Filter(FilterConfig::new(
        "name",
        FilterOperator::Contains,
        "o'b",
    )));
    session.connect(load, filter).unwrap();

    orchestrator.execute(&mut session, load).await.unwrap();

    let result = session.result(filter).unwrap();
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["name"], json!("o'brien"));
}

#[tokio::test]
async fn keyword_named_source_runs() {
    let orchestrator = Orchestrator::with_defaults(DuckDbEngine::open_in_memory().unwrap());
    let order = TableName::from("order");
    let columns = orchestrator
        .ingest(&order, "id,amount\n1,5\n2,7\n3,9\n")
        .await
        .unwrap();
    assert_eq!(columns.len(), 2);

    let mut session = Session::new();
    let load = session.add_block_with_config(BlockConfig::Load(LoadConfig::new("order")));
    let filter = session.add_block_with_config(BlockConfig::Filter(FilterConfig::new(
        "amount",
        FilterOperator::Gt,
        5,
    )));
    let sort = session.add_block_with_config(BlockConfig::Sort(SortConfig::new(
        "amount",
        SortDirection::Desc,
    )));
    session.connect(load, filter).unwrap();
    session.connect(filter, sort).unwrap();

    let report = orchestrator.execute_all(&mut session).await;
    assert!(report.is_success(), "{report:?}");

    assert_eq!(session.result(load).unwrap().row_count, 3);
    let sorted = session.result(sort).unwrap();
    assert_eq!(sorted.row_count, 2);
    assert_eq!(sorted.rows[0]["id"], json!(3));
}

#[tokio::test]
async fn removing_a_chart_drops_its_view() {
    let orchestrator = Orchestrator::with_defaults(engine_with_sales().await);
    let mut session = Session::new();
    let load = session.add_block_with_config(BlockConfig::Load(LoadConfig::new("sales")));
    let insight = session.add_block(BlockKind::Insight);
    session.connect(load, insight).unwrap();
    orchestrator.execute(&mut session, load).await.unwrap();

    let view = TableName::derived(insight);
    assert!(!orchestrator.engine().describe_table(&view).await.unwrap().is_empty());

    orchestrator.remove_block(&mut session, insight).await.unwrap();
    assert!(orchestrator.engine().describe_table(&view).await.unwrap().is_empty());
}

#[tokio::test]
async fn demo_pipeline_runs() {
    let definition =
        PipelineDefinition::from_json(include_str!("../../../demos/sales.json")).unwrap();
    let mut session = Session::from_definition(&definition).unwrap();

    let orchestrator = Orchestrator::with_defaults(DuckDbEngine::open_in_memory().unwrap());
    orchestrator
        .ingest(
            &TableName::from("sales"),
            include_str!("../../../demos/sales.csv"),
        )
        .await
        .unwrap();

    let report = orchestrator.execute_all(&mut session).await;
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.succeeded().len(), definition.blocks.len());

    let chart = definition.blocks[4].id;
    let result = session.result(chart).unwrap();
    assert_eq!(result.rows[0]["region"], json!("north"));
    assert_eq!(result.rows[0]["total"], json!(420));

    let gadgets = definition.blocks[5].id;
    assert_eq!(session.result(gadgets).unwrap().row_count, 3);
}
