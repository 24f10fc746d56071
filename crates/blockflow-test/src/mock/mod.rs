//! Mock implementations of the runtime's collaborators.

mod engine;
mod table;

pub use engine::MockEngine;
pub use table::MockTable;
