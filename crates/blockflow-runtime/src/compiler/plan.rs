//! Whole-pipeline compilation.

use serde::{Deserialize, Serialize};

use super::{SqlStatement, compile, validate};
use crate::block::{Block, BlockConfig, BlockId, BlockKind, TableName};
use crate::graph::PipelineGraph;

/// A block compiled as part of a [`CompiledPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledBlock {
    /// Block identifier.
    pub block_id: BlockId,
    /// Block kind.
    pub kind: BlockKind,
    /// Table the block reads; absent for sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<TableName>,
    /// Table or view the block produces.
    pub output: TableName,
    /// Statement materializing `output`; empty for sources.
    pub sql: SqlStatement,
}

/// A block left out of a [`CompiledPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBlock {
    /// Block identifier.
    pub block_id: BlockId,
    /// Why the block could not be compiled.
    pub reason: String,
}

/// The statements a full run of the pipeline would issue, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPlan {
    /// Compiled blocks, each after its upstream block.
    pub blocks: Vec<CompiledBlock>,
    /// Blocks that are invalid, unconnected, or downstream of one that is.
    pub skipped: Vec<SkippedBlock>,
}

impl CompiledPlan {
    /// Returns the compiled entry of a block.
    pub fn get(&self, id: BlockId) -> Option<&CompiledBlock> {
        self.blocks.iter().find(|block| block.block_id == id)
    }

    /// Returns the non-empty statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &SqlStatement> + '_ {
        self.blocks
            .iter()
            .map(|block| &block.sql)
            .filter(|sql| !sql.is_empty())
    }
}

/// Returns the table a block produces when it runs successfully.
pub fn output_table_of(block: &Block) -> TableName {
    match block.config() {
        BlockConfig::Load(config) => TableName::new(config.table_name.as_str()),
        _ => TableName::derived(block.id()),
    }
}

/// Compiles every block of the graph without touching an engine.
///
/// Input tables are predicted from the graph rather than read from previous
/// runs, so the plan is the same whether or not the pipeline has executed.
pub fn compile_plan(graph: &PipelineGraph) -> CompiledPlan {
    let mut plan = CompiledPlan::default();

    for id in graph.topological_order() {
        let Some(block) = graph.get(id) else {
            continue;
        };

        let skip = |reason: String| SkippedBlock {
            block_id: id,
            reason,
        };

        if let Err(err) = validate(block) {
            plan.skipped.push(skip(err.to_string()));
            continue;
        }

        let output = output_table_of(block);
        if block.kind().is_source() {
            plan.blocks.push(CompiledBlock {
                block_id: id,
                kind: block.kind(),
                input: None,
                output,
                sql: SqlStatement::empty(),
            });
            continue;
        }

        let Some(upstream) = graph.upstream_of(id) else {
            plan.skipped.push(skip("No input connected".into()));
            continue;
        };
        let Some(input) = plan.get(upstream).map(|compiled| compiled.output.clone()) else {
            plan.skipped.push(skip(format!("upstream block {upstream} was skipped")));
            continue;
        };

        let sql = compile(block.config(), &input, &output);
        plan.blocks.push(CompiledBlock {
            block_id: id,
            kind: block.kind(),
            input: Some(input),
            output,
            sql,
        });
    }

    plan
}
