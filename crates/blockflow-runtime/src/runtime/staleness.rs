//! Staleness propagation.
//!
//! A configuration edit invalidates the cached results of the blocks that
//! depend on the edited one. Which blocks count as dependent is chosen by a
//! [`StalenessPolicy`]. Staleness is cleared only by a successful run of the
//! stale block itself.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::block::BlockId;
use crate::graph::PipelineGraph;

/// Tracing target for staleness propagation.
const TRACING_TARGET: &str = "blockflow_runtime::staleness";

/// How a configuration edit selects the blocks it marks stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StalenessPolicy {
    /// Every block positioned after the edited one in the pipeline.
    ///
    /// Exact for a single linear chain. In branching graphs it may mark
    /// unrelated blocks, and miss dependents that were moved earlier.
    #[default]
    Position,
    /// Every block reachable from the edited one through connections.
    Reachability,
}

impl StalenessPolicy {
    /// Returns the blocks invalidated by an edit of `id`.
    pub fn affected(self, graph: &PipelineGraph, id: BlockId) -> Vec<BlockId> {
        match self {
            Self::Position => graph.blocks_after(id),
            Self::Reachability => graph.downstream_of(id),
        }
    }
}

/// Marks the blocks invalidated by an edit of `id` as stale.
///
/// Returns the marked blocks. The edited block itself is left untouched.
pub(crate) fn mark_stale(
    graph: &mut PipelineGraph,
    id: BlockId,
    policy: StalenessPolicy,
) -> Vec<BlockId> {
    let affected = policy.affected(graph, id);
    for stale in &affected {
        if let Some(block) = graph.get_mut(*stale) {
            block.mark_stale();
        }
    }

    tracing::debug!(
        target: TRACING_TARGET,
        block_id = %id,
        %policy,
        marked = affected.len(),
        "downstream blocks marked stale"
    );
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;

    /// Load -> Filter, plus an unconnected Sort after them and a Chart
    /// fed by the filter but positioned first.
    fn branching() -> (PipelineGraph, [BlockId; 4]) {
        let mut graph = PipelineGraph::new();
        let chart = graph.add_block(BlockKind::Chart);
        let load = graph.add_block(BlockKind::Load);
        let filter = graph.add_block(BlockKind::Filter);
        let sort = graph.add_block(BlockKind::Sort);
        graph.connect(load, filter).unwrap();
        graph.connect(filter, chart).unwrap();
        (graph, [chart, load, filter, sort])
    }

    #[test]
    fn position_marks_later_blocks() {
        let (mut graph, [chart, load, filter, sort]) = branching();
        let marked = mark_stale(&mut graph, load, StalenessPolicy::Position);

        assert_eq!(marked, vec![filter, sort]);
        assert!(graph.block(sort).unwrap().is_stale());
        assert!(!graph.block(chart).unwrap().is_stale());
        assert!(!graph.block(load).unwrap().is_stale());
    }

    #[test]
    fn reachability_follows_connections() {
        let (mut graph, [chart, load, filter, sort]) = branching();
        let marked = mark_stale(&mut graph, load, StalenessPolicy::Reachability);

        assert_eq!(marked, vec![filter, chart]);
        assert!(graph.block(chart).unwrap().is_stale());
        assert!(!graph.block(sort).unwrap().is_stale());
    }

    #[test]
    fn parses_from_str() {
        assert_eq!(
            "reachability".parse::<StalenessPolicy>().unwrap(),
            StalenessPolicy::Reachability
        );
        assert_eq!(StalenessPolicy::default().as_ref(), "position");
    }
}
