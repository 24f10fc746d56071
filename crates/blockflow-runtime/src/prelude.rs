//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use blockflow_runtime::prelude::*;
//! ```

pub use crate::block::{
    AggregateConfig, AggregateFunc, Block, BlockConfig, BlockId, BlockKind, BlockStatus,
    ChartConfig, ChartType, FilterConfig, FilterOperator, FilterValue, InsightConfig, LoadConfig,
    Metric, SortConfig, SortDirection, TableName,
};
pub use crate::compiler::{CompiledPlan, SqlStatement};
pub use crate::engine::{AnalyticalEngine, ColumnDescription, ColumnInfo, EngineError, Row};
pub use crate::error::{Error, Result};
pub use crate::graph::{Connection, PipelineDefinition, PipelineGraph};
pub use crate::runtime::{
    BlockOutcome, BlockResult, ExecutionReport, Orchestrator, OrchestratorConfig, Session,
    StalenessPolicy,
};
