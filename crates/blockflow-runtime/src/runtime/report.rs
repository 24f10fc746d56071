//! Execution reports.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::BlockId;

/// What happened to one block during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum BlockOutcome {
    /// The block executed and its result was cached.
    Succeeded,
    /// The block failed with the given message.
    Failed(String),
    /// The block was not executed because its upstream block did not succeed.
    Skipped,
}

/// A block visited during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRun {
    /// Block identifier.
    pub block_id: BlockId,
    /// Outcome of the visit.
    #[serde(flatten)]
    pub outcome: BlockOutcome,
}

/// Record of a single `execute` or `execute_all` call.
///
/// Blocks appear in the order they were visited; each at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Block the run was triggered on; absent for whole-pipeline runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<BlockId>,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished.
    pub finished_at: Timestamp,
    /// Visited blocks in visit order.
    pub blocks: Vec<BlockRun>,
}

impl ExecutionReport {
    pub(crate) fn start(trigger: Option<BlockId>) -> Self {
        let now = Timestamp::now();
        Self {
            run_id: Uuid::new_v4(),
            trigger,
            started_at: now,
            finished_at: now,
            blocks: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, block_id: BlockId, outcome: BlockOutcome) {
        self.blocks.push(BlockRun { block_id, outcome });
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Timestamp::now();
        self
    }

    /// Returns the outcome recorded for a block.
    pub fn outcome(&self, block_id: BlockId) -> Option<&BlockOutcome> {
        self.blocks
            .iter()
            .find(|run| run.block_id == block_id)
            .map(|run| &run.outcome)
    }

    /// Returns how many times a block was executed or skipped in this run.
    pub fn visits(&self, block_id: BlockId) -> usize {
        self.blocks
            .iter()
            .filter(|run| run.block_id == block_id)
            .count()
    }

    /// Returns the blocks that succeeded, in visit order.
    pub fn succeeded(&self) -> Vec<BlockId> {
        self.filter(|outcome| matches!(outcome, BlockOutcome::Succeeded))
    }

    /// Returns the blocks that failed, in visit order.
    pub fn failed(&self) -> Vec<BlockId> {
        self.filter(|outcome| matches!(outcome, BlockOutcome::Failed(_)))
    }

    /// Returns the blocks that were skipped, in visit order.
    pub fn skipped(&self) -> Vec<BlockId> {
        self.filter(|outcome| matches!(outcome, BlockOutcome::Skipped))
    }

    /// Returns whether every visited block succeeded.
    pub fn is_success(&self) -> bool {
        self.blocks
            .iter()
            .all(|run| run.outcome == BlockOutcome::Succeeded)
    }

    /// Returns the wall-clock duration of the run.
    pub fn duration(&self) -> SignedDuration {
        self.finished_at.duration_since(self.started_at)
    }

    fn filter(&self, predicate: impl Fn(&BlockOutcome) -> bool) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|run| predicate(&run.outcome))
            .map(|run| run.block_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_outcomes() {
        let (a, b, c) = (BlockId::new(), BlockId::new(), BlockId::new());
        let mut report = ExecutionReport::start(Some(a));
        report.record(a, BlockOutcome::Succeeded);
        report.record(b, BlockOutcome::Failed("boom".into()));
        report.record(c, BlockOutcome::Skipped);
        let report = report.finish();

        assert_eq!(report.succeeded(), vec![a]);
        assert_eq!(report.failed(), vec![b]);
        assert_eq!(report.skipped(), vec![c]);
        assert_eq!(report.visits(b), 1);
        assert!(!report.is_success());
        assert!(report.duration() >= SignedDuration::ZERO);
    }

    #[test]
    fn serializes_flat_outcome() {
        let id = BlockId::new();
        let mut report = ExecutionReport::start(None);
        report.record(id, BlockOutcome::Failed("No input connected".into()));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["blocks"][0]["outcome"], "failed");
        assert_eq!(value["blocks"][0]["message"], "No input connected");
        assert!(value.get("trigger").is_none());
    }
}
