//! Pipeline editing sessions.

use serde_json::Value;

use super::result::{BlockResult, ResultStore};
use super::staleness::{StalenessPolicy, mark_stale};
use crate::block::{Block, BlockConfig, BlockId, BlockKind};
use crate::compiler::{CompiledPlan, compile_plan};
use crate::error::{Error, Result};
use crate::graph::{PipelineDefinition, PipelineGraph, PipelineMetadata};

/// Tracing target for session edits.
const TRACING_TARGET: &str = "blockflow_runtime::session";

/// One pipeline being edited and executed.
///
/// A session owns its graph, its cached results and its staleness policy.
/// Independent sessions share nothing, so several pipelines can be edited
/// and executed side by side against the same engine.
#[derive(Debug, Clone, Default)]
pub struct Session {
    metadata: PipelineMetadata,
    graph: PipelineGraph,
    results: ResultStore,
    staleness: StalenessPolicy,
}

impl Session {
    /// Creates an empty session with the default staleness policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the staleness policy.
    pub fn with_staleness(mut self, policy: StalenessPolicy) -> Self {
        self.staleness = policy;
        self
    }

    /// Creates a session from a pipeline definition.
    pub fn from_definition(definition: &PipelineDefinition) -> Result<Self> {
        let graph = definition.to_graph()?;

        tracing::debug!(
            target: TRACING_TARGET,
            blocks = graph.len(),
            connections = graph.connection_count(),
            "session loaded from definition"
        );

        Ok(Self {
            metadata: definition.metadata.clone(),
            graph,
            ..Self::default()
        })
    }

    /// Captures the session's pipeline as a definition.
    pub fn to_definition(&self) -> PipelineDefinition {
        PipelineDefinition::from_graph(&self.graph, self.metadata.clone())
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: PipelineMetadata) {
        self.metadata = metadata;
    }

    pub fn staleness(&self) -> StalenessPolicy {
        self.staleness
    }

    pub fn set_staleness(&mut self, policy: StalenessPolicy) {
        self.staleness = policy;
    }

    /// Returns the pipeline graph.
    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut PipelineGraph {
        &mut self.graph
    }

    /// Returns the cached results.
    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    /// Returns a block.
    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.graph.block(id)
    }

    /// Returns all blocks in pipeline order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.graph.blocks()
    }

    /// Returns the cached result of a block.
    pub fn result(&self, id: BlockId) -> Option<&BlockResult> {
        self.results.get(id)
    }

    /// Adds an idle block with the default configuration for `kind`.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        self.graph.add_block(kind)
    }

    /// Adds an idle block with the given configuration.
    pub fn add_block_with_config(&mut self, config: BlockConfig) -> BlockId {
        self.graph.add_block_with_config(config)
    }

    /// Connects `source` to `target`, replacing any existing input of
    /// `target`. Returns the replaced upstream block.
    pub fn connect(&mut self, source: BlockId, target: BlockId) -> Result<Option<BlockId>> {
        self.graph.connect(source, target)
    }

    /// Removes the input connection of `target`.
    pub fn disconnect(&mut self, target: BlockId) -> Option<BlockId> {
        self.graph.disconnect(target)
    }

    /// Removes a block, its connections and its cached result.
    ///
    /// The block's derived table stays in the engine; use
    /// [`Orchestrator::remove_block`] to drop it as well.
    ///
    /// [`Orchestrator::remove_block`]: super::Orchestrator::remove_block
    pub fn remove_block(&mut self, id: BlockId) -> Result<Block> {
        let block = self.graph.remove_block(id).ok_or(Error::BlockNotFound(id))?;
        self.results.remove(id);
        Ok(block)
    }

    pub fn rename_block(&mut self, id: BlockId, label: impl Into<String>) -> Result<()> {
        self.graph.rename_block(id, label)
    }

    pub fn duplicate_block(&mut self, id: BlockId) -> Result<BlockId> {
        self.graph.duplicate_block(id)
    }

    pub fn move_block(&mut self, id: BlockId, to: usize) -> Result<()> {
        self.graph.move_block(id, to)
    }

    /// Merges a partial configuration into a block's configuration and marks
    /// the blocks that depend on it stale.
    ///
    /// `patch` is a JSON object whose keys replace the matching top-level
    /// fields of the current configuration. It may not change the block's
    /// kind. Returns the blocks marked stale.
    pub fn update_config(&mut self, id: BlockId, patch: Value) -> Result<Vec<BlockId>> {
        let block = self.graph.block(id)?;
        let kind = block.kind();
        let invalid = |message: String| Error::InvalidConfig {
            block_id: id,
            kind,
            message,
        };

        let Value::Object(patch) = patch else {
            return Err(invalid("config patch must be a JSON object".into()));
        };

        let type_name: &str = kind.as_ref();
        let mut merged = serde_json::to_value(block.config())?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in patch {
                if key == "type" && value.as_str() != Some(type_name) {
                    return Err(invalid(format!("cannot change block type to {value}")));
                }
                fields.insert(key, value);
            }
        }

        let config: BlockConfig =
            serde_json::from_value(merged).map_err(|err| invalid(err.to_string()))?;
        self.replace_config(id, config)
    }

    /// Replaces a block's configuration and marks the blocks that depend on
    /// it stale. The new configuration must be of the block's kind.
    pub fn set_config(&mut self, id: BlockId, config: BlockConfig) -> Result<Vec<BlockId>> {
        let kind = self.graph.block(id)?.kind();
        if config.kind() != kind {
            return Err(Error::InvalidConfig {
                block_id: id,
                kind,
                message: format!("cannot change block type to {}", config.kind()),
            });
        }
        self.replace_config(id, config)
    }

    fn replace_config(&mut self, id: BlockId, config: BlockConfig) -> Result<Vec<BlockId>> {
        self.graph.block_mut(id)?.set_config(config);

        tracing::debug!(target: TRACING_TARGET, block_id = %id, "block config updated");
        Ok(mark_stale(&mut self.graph, id, self.staleness))
    }

    /// Compiles the whole pipeline without executing it.
    pub fn compile_plan(&self) -> CompiledPlan {
        compile_plan(&self.graph)
    }
}
