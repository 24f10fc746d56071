//! Pipeline graph runtime representation.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Bfs, EdgeRef};

use super::connection::Connection;
use crate::block::{Block, BlockConfig, BlockId, BlockKind};
use crate::error::{Error, Result};

/// Tracing target for graph mutations.
const TRACING_TARGET: &str = "blockflow_runtime::graph";

/// The set of blocks and the directed connections between them.
///
/// Blocks live in a petgraph `StableDiGraph`, so node indices stay valid when
/// other blocks are removed, and are addressed externally by [`BlockId`].
/// A block has at most one inbound connection; fan-out is unrestricted and
/// the graph is kept acyclic at connect time.
///
/// The graph also records the pipeline position of every block, the linear
/// order in which blocks were added (or later moved).
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    /// The underlying directed graph.
    graph: StableDiGraph<Block, ()>,
    /// Mapping from BlockId to petgraph's NodeIndex.
    node_indices: HashMap<BlockId, NodeIndex>,
    /// Pipeline positions.
    order: Vec<BlockId>,
}

impl PipelineGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blocks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the graph has no blocks.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the number of connections.
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether a block exists.
    pub fn contains(&self, id: BlockId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Adds an idle block with the default configuration for `kind`.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId::new();
        self.insert(Block::new(id, kind));
        id
    }

    /// Adds an idle block with the given configuration.
    pub fn add_block_with_config(&mut self, config: BlockConfig) -> BlockId {
        let id = BlockId::new();
        self.insert(Block::with_config(id, config));
        id
    }

    /// Adds an idle block under a caller-chosen ID.
    pub fn add_block_with_id(&mut self, id: BlockId, config: BlockConfig) -> Result<()> {
        if self.contains(id) {
            return Err(Error::InvalidConfig {
                block_id: id,
                kind: config.kind(),
                message: "a block with this id already exists".into(),
            });
        }
        self.insert(Block::with_config(id, config));
        Ok(())
    }

    fn insert(&mut self, block: Block) {
        let id = block.id();
        let kind = block.kind();
        let index = self.graph.add_node(block);
        self.node_indices.insert(id, index);
        self.order.push(id);

        tracing::debug!(target: TRACING_TARGET, block_id = %id, %kind, "block added");
    }

    /// Removes a block and every connection touching it.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let index = self.node_indices.remove(&id)?;
        self.order.retain(|other| *other != id);
        let block = self.graph.remove_node(index);

        tracing::debug!(target: TRACING_TARGET, block_id = %id, "block removed");
        block
    }

    /// Returns a reference to a block.
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        let index = self.node_indices.get(&id)?;
        self.graph.node_weight(*index)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        let index = self.node_indices.get(&id)?;
        self.graph.node_weight_mut(*index)
    }

    /// Returns a reference to a block, or [`Error::BlockNotFound`].
    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.get(id).ok_or(Error::BlockNotFound(id))
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.get_mut(id).ok_or(Error::BlockNotFound(id))
    }

    /// Returns all blocks in pipeline order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Returns all block IDs in pipeline order.
    pub fn block_ids(&self) -> &[BlockId] {
        &self.order
    }

    /// Returns the pipeline position of a block.
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    /// Returns every block positioned after `id` in the pipeline.
    pub fn blocks_after(&self, id: BlockId) -> Vec<BlockId> {
        match self.position(id) {
            Some(position) => self.order[position + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Moves a block to a new pipeline position, clamped to the end.
    pub fn move_block(&mut self, id: BlockId, to: usize) -> Result<()> {
        let from = self.position(id).ok_or(Error::BlockNotFound(id))?;
        let block = self.order.remove(from);
        let to = to.min(self.order.len());
        self.order.insert(to, block);

        tracing::debug!(target: TRACING_TARGET, block_id = %id, from, to, "block moved");
        Ok(())
    }

    /// Renames a block.
    pub fn rename_block(&mut self, id: BlockId, label: impl Into<String>) -> Result<()> {
        self.block_mut(id)?.set_label(label);
        Ok(())
    }

    /// Copies a block's kind, configuration and label into a new idle block
    /// positioned right after the original. Connections are not copied.
    pub fn duplicate_block(&mut self, id: BlockId) -> Result<BlockId> {
        let copy_id = BlockId::new();
        let copy = self.block(id)?.duplicate(copy_id);
        let position = self.position(id).map_or(self.order.len(), |p| p + 1);

        self.insert(copy);
        self.move_block(copy_id, position)?;
        Ok(copy_id)
    }

    /// Connects `source`'s output to `target`'s input.
    ///
    /// A block accepts a single input, so any existing inbound connection on
    /// `target` is replaced; the replaced upstream block is returned.
    /// Self-loops, cycles and connections into source blocks are rejected.
    pub fn connect(&mut self, source: BlockId, target: BlockId) -> Result<Option<BlockId>> {
        let source_index = *self
            .node_indices
            .get(&source)
            .ok_or(Error::BlockNotFound(source))?;
        let target_index = *self
            .node_indices
            .get(&target)
            .ok_or(Error::BlockNotFound(target))?;

        let reject = |reason: &str| Error::InvalidConnection {
            source_id: source,
            target_id: target,
            reason: reason.to_owned(),
        };

        if source == target {
            return Err(reject("a block cannot be its own input"));
        }
        if self.graph[target_index].kind().is_source() {
            return Err(reject("load blocks do not accept an input"));
        }
        if has_path_connecting(&self.graph, target_index, source_index, None) {
            return Err(reject("connection would create a cycle"));
        }

        let previous = self.upstream_of(target);
        if previous == Some(source) {
            return Ok(None);
        }

        self.disconnect(target);
        self.graph.add_edge(source_index, target_index, ());

        tracing::debug!(
            target: TRACING_TARGET,
            %source,
            %target,
            replaced = ?previous,
            "blocks connected"
        );
        Ok(previous)
    }

    /// Removes the inbound connection of `target`, returning its source.
    pub fn disconnect(&mut self, target: BlockId) -> Option<BlockId> {
        let previous = self.upstream_of(target)?;
        let index = *self.node_indices.get(&target)?;
        let edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| edge.id())
            .collect();
        for edge in edges {
            self.graph.remove_edge(edge);
        }
        Some(previous)
    }

    /// Returns the block feeding `id`, if any.
    pub fn upstream_of(&self, id: BlockId) -> Option<BlockId> {
        let index = self.node_indices.get(&id)?;
        self.graph
            .neighbors_directed(*index, Direction::Incoming)
            .next()
            .map(|upstream| self.graph[upstream].id())
    }

    /// Returns the blocks directly fed by `id`, in pipeline order.
    pub fn children_of(&self, id: BlockId) -> Vec<BlockId> {
        let Some(index) = self.node_indices.get(&id) else {
            return Vec::new();
        };
        let children: HashSet<BlockId> = self
            .graph
            .neighbors_directed(*index, Direction::Outgoing)
            .map(|child| self.graph[child].id())
            .collect();

        self.order
            .iter()
            .filter(|other| children.contains(other))
            .copied()
            .collect()
    }

    /// Returns every block reachable from `id`, excluding `id` itself.
    ///
    /// Each reachable block appears exactly once. The traversal is
    /// breadth-first, so every block is listed after its upstream block.
    pub fn downstream_of(&self, id: BlockId) -> Vec<BlockId> {
        let Some(start) = self.node_indices.get(&id).copied() else {
            return Vec::new();
        };

        let mut bfs = Bfs::new(&self.graph, start);
        let mut downstream = Vec::new();
        while let Some(index) = bfs.next(&self.graph) {
            if index != start {
                downstream.push(self.graph[index].id());
            }
        }
        downstream
    }

    /// Returns all connections, ordered by target pipeline position.
    pub fn connections(&self) -> Vec<Connection> {
        self.order
            .iter()
            .filter_map(|target| {
                self.upstream_of(*target)
                    .map(|source| Connection::new(source, *target))
            })
            .collect()
    }

    /// Returns the source blocks in pipeline order.
    pub fn roots(&self) -> Vec<BlockId> {
        self.blocks()
            .filter(|block| block.kind().is_source())
            .map(Block::id)
            .collect()
    }

    /// Returns all blocks ordered so that every block follows its upstream
    /// block; independent blocks keep their pipeline order.
    pub fn topological_order(&self) -> Vec<BlockId> {
        let mut emitted = HashSet::with_capacity(self.order.len());
        let mut ordered = Vec::with_capacity(self.order.len());

        for id in &self.order {
            let mut chain = Vec::new();
            let mut cursor = Some(*id);
            while let Some(current) = cursor {
                if emitted.contains(&current) {
                    break;
                }
                chain.push(current);
                cursor = self.upstream_of(current);
            }
            for current in chain.into_iter().rev() {
                emitted.insert(current);
                ordered.push(current);
            }
        }
        ordered
    }
}
