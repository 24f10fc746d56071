//! Block execution orchestrator.

use std::collections::HashSet;

use super::config::OrchestratorConfig;
use super::report::{BlockOutcome, ExecutionReport};
use super::result::BlockResult;
use super::session::Session;
use crate::block::{Block, BlockConfig, BlockId, TableName};
use crate::compiler::{
    ROW_COUNT_COLUMN, compile, compile_count, compile_drop, compile_preview, validate,
};
use crate::engine::{AnalyticalEngine, ColumnInfo, Row};
use crate::error::{Error, Result};

/// Tracing target for orchestrator operations.
const TRACING_TARGET: &str = "blockflow_runtime::orchestrator";

/// Validates, compiles and runs blocks against an [`AnalyticalEngine`],
/// caching their results and cascading into downstream blocks.
///
/// The orchestrator holds no pipeline state of its own: every operation
/// takes the [`Session`] it acts on. Statements are issued one at a time
/// and each is awaited before the next, so a downstream block never starts
/// before its upstream table has been written.
pub struct Orchestrator<E> {
    engine: E,
    config: OrchestratorConfig,
}

impl<E: AnalyticalEngine> Orchestrator<E> {
    /// Creates a new orchestrator with the given configuration.
    pub fn new(engine: E, config: OrchestratorConfig) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            preview_limit = config.preview_limit,
            drop_on_remove = config.drop_on_remove,
            "orchestrator initialized"
        );

        Self { engine, config }
    }

    /// Creates a new orchestrator with default configuration.
    pub fn with_defaults(engine: E) -> Self {
        Self::new(engine, OrchestratorConfig::default())
    }

    /// Returns the orchestrator configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Registers CSV content as the source table `name` and returns its schema.
    pub async fn ingest(&self, name: &TableName, content: &str) -> Result<Vec<ColumnInfo>> {
        tracing::debug!(
            target: TRACING_TARGET,
            table = %name,
            bytes = content.len(),
            "ingesting source"
        );

        self.engine.register_source_file(name, content).await?;
        let columns = self.engine.describe_table(name).await?;
        Ok(columns.into_iter().map(ColumnInfo::from).collect())
    }

    /// Executes a block, then every block downstream of it.
    ///
    /// Failures are attributed to the failing block through its status and
    /// stop the cascade below it; blocks under a failed block keep their
    /// previous status and are reported as skipped. The only error returned
    /// is [`Error::BlockNotFound`] for an unknown `id`.
    pub async fn execute(&self, session: &mut Session, id: BlockId) -> Result<ExecutionReport> {
        if !session.graph().contains(id) {
            return Err(Error::BlockNotFound(id));
        }

        tracing::info!(target: TRACING_TARGET, block_id = %id, "execution started");

        let mut report = ExecutionReport::start(Some(id));
        let mut visited = HashSet::new();
        self.cascade(session, id, &mut visited, &mut report).await;

        let report = report.finish();
        tracing::info!(
            target: TRACING_TARGET,
            block_id = %id,
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            "execution finished"
        );
        Ok(report)
    }

    /// Executes every source block in pipeline order, each with its cascade.
    ///
    /// A block is executed at most once per call.
    pub async fn execute_all(&self, session: &mut Session) -> ExecutionReport {
        let roots = session.graph().roots();
        tracing::info!(
            target: TRACING_TARGET,
            sources = roots.len(),
            "pipeline execution started"
        );

        let mut report = ExecutionReport::start(None);
        let mut visited = HashSet::new();
        for root in roots {
            self.cascade(session, root, &mut visited, &mut report).await;
        }

        let report = report.finish();
        tracing::info!(
            target: TRACING_TARGET,
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            "pipeline execution finished"
        );
        report
    }

    /// Removes a block from the session and, when configured, drops its
    /// derived table or view from the engine.
    ///
    /// A failed drop is logged and does not prevent the removal.
    pub async fn remove_block(&self, session: &mut Session, id: BlockId) -> Result<Block> {
        let block = session.remove_block(id)?;

        if self.config.drop_on_remove
            && let Some(table) = block.output_table()
        {
            let sql = compile_drop(block.kind(), table);
            if !sql.is_empty() {
                tracing::debug!(target: TRACING_TARGET, block_id = %id, sql = %sql, "dropping output");
                if let Err(err) = self.engine.execute(sql.as_str()).await {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        block_id = %id,
                        error = %err,
                        "failed to drop block output"
                    );
                }
            }
        }

        Ok(block)
    }

    /// Runs `root` and, if it succeeds, its downstream blocks in dependency
    /// order. Blocks already in `visited` are not run again.
    async fn cascade(
        &self,
        session: &mut Session,
        root: BlockId,
        visited: &mut HashSet<BlockId>,
        report: &mut ExecutionReport,
    ) {
        if !visited.insert(root) {
            return;
        }
        if !self.run_block(session, root, report).await {
            return;
        }

        let downstream = session.graph().downstream_of(root);
        tracing::debug!(
            target: TRACING_TARGET,
            block_id = %root,
            downstream = downstream.len(),
            "cascading downstream"
        );

        let mut halted = HashSet::new();
        for id in downstream {
            if !visited.insert(id) {
                continue;
            }

            let upstream = session.graph().upstream_of(id);
            if upstream.is_some_and(|upstream| halted.contains(&upstream)) {
                halted.insert(id);
                report.record(id, BlockOutcome::Skipped);
                continue;
            }

            if !self.run_block(session, id, report).await {
                halted.insert(id);
            }
        }
    }

    /// Runs a single block and records its outcome. Returns whether it
    /// succeeded.
    async fn run_block(
        &self,
        session: &mut Session,
        id: BlockId,
        report: &mut ExecutionReport,
    ) -> bool {
        let outcome = self.materialize(session, id).await;
        let Some(block) = session.graph_mut().get_mut(id) else {
            return false;
        };

        match outcome {
            Ok((table, result)) => {
                block.succeed(table);
                tracing::debug!(
                    target: TRACING_TARGET,
                    block_id = %id,
                    row_count = result.row_count,
                    "block succeeded"
                );

                session.results_mut().insert(id, result);
                report.record(id, BlockOutcome::Succeeded);
                true
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(
                    target: TRACING_TARGET,
                    block_id = %id,
                    error = %message,
                    "block failed"
                );

                block.fail(message.clone());
                report.record(id, BlockOutcome::Failed(message));
                false
            }
        }
    }

    /// Validates, compiles and executes a block, returning its output table
    /// and fresh result.
    async fn materialize(
        &self,
        session: &mut Session,
        id: BlockId,
    ) -> Result<(TableName, BlockResult)> {
        let block = session.graph().block(id)?;
        validate(block)?;
        let config = block.config().clone();
        session.graph_mut().block_mut(id)?.start();

        let output = match &config {
            BlockConfig::Load(load) => TableName::new(load.table_name.as_str()),
            config => {
                let input = session
                    .graph()
                    .upstream_of(id)
                    .and_then(|upstream| session.graph().get(upstream))
                    .and_then(|upstream| upstream.output_table().cloned())
                    .ok_or(Error::MissingInput)?;

                let output = TableName::derived(id);
                let sql = compile(config, &input, &output);
                if !sql.is_empty() {
                    tracing::debug!(target: TRACING_TARGET, block_id = %id, sql = %sql, "executing");
                    self.engine.execute(sql.as_str()).await?;
                }
                output
            }
        };

        let result = self.fetch_result(&output).await?;
        Ok((output, result))
    }

    /// Reads the schema, a bounded preview and the row count of a table.
    async fn fetch_result(&self, table: &TableName) -> Result<BlockResult> {
        let columns = self
            .engine
            .describe_table(table)
            .await?
            .into_iter()
            .map(ColumnInfo::from)
            .collect();

        let preview = compile_preview(table, self.config.preview_limit);
        let rows = self.engine.execute(preview.as_str()).await?;

        let count = compile_count(table);
        let counted = self.engine.execute(count.as_str()).await?;
        let row_count = counted
            .first()
            .and_then(read_row_count)
            .unwrap_or(rows.len() as u64);

        Ok(BlockResult {
            columns,
            rows,
            row_count,
        })
    }
}

fn read_row_count(row: &Row) -> Option<u64> {
    let value = row
        .get(ROW_COUNT_COLUMN)
        .or_else(|| row.values().next())?;

    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.parse().ok()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn reads_row_count_variants() {
        assert_eq!(read_row_count(&row(json!({ "row_count": 42 }))), Some(42));
        assert_eq!(read_row_count(&row(json!({ "row_count": "7" }))), Some(7));
        assert_eq!(read_row_count(&row(json!({ "count_star()": 3 }))), Some(3));
        assert_eq!(read_row_count(&row(json!({}))), None);
    }
}
