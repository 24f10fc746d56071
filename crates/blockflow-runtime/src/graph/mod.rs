//! Pipeline graph types.
//!
//! The graph owns every block and the directed connections between them.
//! Structural rules (single input per block, no cycles, no input into a
//! source block) are enforced at connect time.

mod connection;
mod definition;
#[allow(clippy::module_inception)]
mod graph;

pub use connection::Connection;
pub use definition::{BlockDefinition, PipelineDefinition, PipelineMetadata};
pub use graph::PipelineGraph;
