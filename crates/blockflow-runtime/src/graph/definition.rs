//! Serializable pipeline definitions.
//!
//! A [`PipelineDefinition`] is the persisted shape of a pipeline: block
//! identities, labels and configurations plus the connections between them.
//! Execution state (status, output tables, staleness) is not persisted.

use serde::{Deserialize, Serialize};

use super::{Connection, PipelineGraph};
use crate::block::{BlockConfig, BlockId};
use crate::error::Result;

/// Pipeline metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// Pipeline name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pipeline description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A block as stored in a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Block identifier.
    pub id: BlockId,
    /// Display label; the kind's default label when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Block configuration, tagged by kind.
    pub config: BlockConfig,
}

impl BlockDefinition {
    /// Creates a block definition with the default label.
    pub fn new(id: BlockId, config: BlockConfig) -> Self {
        Self {
            id,
            label: None,
            config,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Serializable pipeline definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline metadata.
    #[serde(default)]
    pub metadata: PipelineMetadata,
    /// Blocks in pipeline order.
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
    /// Connections between blocks.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl PipelineDefinition {
    /// Parses a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the definition to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a graph from this definition.
    ///
    /// Connections are applied in order with the usual connect rules, so a
    /// definition listing two inputs for one block keeps the last one.
    pub fn to_graph(&self) -> Result<PipelineGraph> {
        let mut graph = PipelineGraph::new();
        for block in &self.blocks {
            graph.add_block_with_id(block.id, block.config.clone())?;
            if let Some(label) = &block.label {
                graph.rename_block(block.id, label.clone())?;
            }
        }
        for connection in &self.connections {
            graph.connect(connection.source, connection.target)?;
        }
        Ok(graph)
    }

    /// Captures the definition of an existing graph.
    pub fn from_graph(graph: &PipelineGraph, metadata: PipelineMetadata) -> Self {
        let blocks = graph
            .blocks()
            .map(|block| {
                BlockDefinition::new(block.id(), block.config().clone()).with_label(block.label())
            })
            .collect();

        Self {
            metadata,
            blocks,
            connections: graph.connections(),
        }
    }
}
