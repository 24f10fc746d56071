//! Block types.
//!
//! This module defines the typed pipeline stages:
//! - [`Block`]: a stage with configuration and execution state
//! - [`BlockId`]: unique, stable identifier
//! - [`BlockKind`] and [`BlockConfig`]: the closed set of stage types
//! - [`BlockStatus`]: execution state machine
//! - [`TableName`]: names in the engine's table namespace

mod config;
mod id;
mod table;

pub use config::{
    AggregateConfig, AggregateFunc, BlockConfig, BlockKind, ChartConfig, ChartType, FilterConfig,
    FilterOperator, FilterValue, InsightConfig, LoadConfig, Metric, SortConfig, SortDirection,
};
pub use id::BlockId;
use serde::{Deserialize, Serialize};
pub use table::{DERIVED_TABLE_PREFIX, TableName};

/// Execution state of a block.
///
/// Transitions are `Idle -> Running -> {Success, Error}`; a block may be
/// re-run from any state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum BlockStatus {
    /// Never executed.
    #[default]
    Idle,
    /// Currently executing.
    Running,
    /// Last execution succeeded.
    Success,
    /// Last execution failed with the given message.
    Error(String),
}

impl BlockStatus {
    /// Returns whether the last execution succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns whether the last execution failed.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// A typed pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    label: String,
    config: BlockConfig,
    status: BlockStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_table: Option<TableName>,
    is_stale: bool,
}

impl Block {
    /// Creates an idle block with the default configuration for `kind`.
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self::with_config(id, BlockConfig::default_for(kind))
    }

    /// Creates an idle block with the given configuration.
    pub fn with_config(id: BlockId, config: BlockConfig) -> Self {
        Self {
            id,
            label: config.kind().default_label(),
            config,
            status: BlockStatus::Idle,
            output_table: None,
            is_stale: false,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.config.kind()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn status(&self) -> &BlockStatus {
        &self.status
    }

    /// Returns the table or view produced by the last successful run.
    pub fn output_table(&self) -> Option<&TableName> {
        self.output_table.as_ref()
    }

    /// Returns whether the cached result may no longer reflect upstream state.
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    /// Returns the failure message of the last run, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub(crate) fn set_config(&mut self, config: BlockConfig) {
        self.config = config;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.is_stale = true;
    }

    pub(crate) fn start(&mut self) {
        self.status = BlockStatus::Running;
    }

    /// Records a successful run. Only this transition clears staleness.
    pub(crate) fn succeed(&mut self, output_table: TableName) {
        self.status = BlockStatus::Success;
        self.output_table = Some(output_table);
        self.is_stale = false;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = BlockStatus::Error(message.into());
    }

    /// Returns a fresh idle copy under a new identity.
    pub(crate) fn duplicate(&self, id: BlockId) -> Self {
        let mut copy = Self::with_config(id, self.config.clone());
        copy.label = format!("{} (Copy)", self.label);
        copy
    }
}
