//! Pipeline execution.
//!
//! This module provides the runtime for editing and executing pipelines:
//! - [`Session`]: one pipeline's graph, cached results and staleness policy
//! - [`Orchestrator`]: runs blocks against an engine and cascades downstream
//! - [`OrchestratorConfig`]: configuration options
//! - [`ExecutionReport`]: what a run did to each block

mod config;
mod orchestrator;
mod report;
mod result;
mod session;
mod staleness;

pub use config::{DEFAULT_PREVIEW_LIMIT, OrchestratorConfig, OrchestratorConfigBuilder};
pub use orchestrator::Orchestrator;
pub use report::{BlockOutcome, BlockRun, ExecutionReport};
pub use result::{BlockResult, ResultStore};
pub use session::Session;
pub use staleness::StalenessPolicy;
