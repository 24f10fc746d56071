//! Engine and orchestration configuration.

use std::path::PathBuf;

use anyhow::Context;
use blockflow_duckdb::DuckDbEngine;
use blockflow_runtime::prelude::{OrchestratorConfig, StalenessPolicy};
use blockflow_runtime::runtime::DEFAULT_PREVIEW_LIMIT;
use clap::Args;

/// Where pipelines run and how results are kept.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// DuckDB database file. An in-memory database is used when omitted.
    #[arg(long, env = "BLOCKFLOW_DATABASE")]
    pub database: Option<PathBuf>,

    /// Number of rows kept in each block's result preview.
    #[arg(long, env = "BLOCKFLOW_PREVIEW_LIMIT", default_value_t = DEFAULT_PREVIEW_LIMIT)]
    pub preview_limit: usize,

    /// Which blocks become stale when a block's configuration changes
    /// (`position` or `reachability`).
    #[arg(long, env = "BLOCKFLOW_STALENESS", default_value_t = StalenessPolicy::Position)]
    pub staleness: StalenessPolicy,

    /// Keep derived tables in the database when blocks are removed.
    #[arg(long, env = "BLOCKFLOW_KEEP_REMOVED")]
    pub keep_removed: bool,
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.orchestrator_config().map(|_| ())
    }

    /// Builds the orchestrator configuration.
    pub fn orchestrator_config(&self) -> anyhow::Result<OrchestratorConfig> {
        OrchestratorConfig::builder()
            .preview_limit(self.preview_limit)
            .drop_on_remove(!self.keep_removed)
            .build()
            .context("failed to build orchestrator configuration")
    }

    /// Opens the configured database.
    pub fn open_engine(&self) -> anyhow::Result<DuckDbEngine> {
        match &self.database {
            Some(path) => DuckDbEngine::open(path)
                .with_context(|| format!("failed to open database {}", path.display())),
            None => DuckDbEngine::open_in_memory().context("failed to open in-memory database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(preview_limit: usize) -> EngineConfig {
        EngineConfig {
            database: None,
            preview_limit,
            staleness: StalenessPolicy::default(),
            keep_removed: false,
        }
    }

    #[test]
    fn builds_orchestrator_config() {
        let built = config(25).orchestrator_config().unwrap();
        assert_eq!(built.preview_limit, 25);
        assert!(built.drop_on_remove);
    }

    #[test]
    fn rejects_zero_preview_limit() {
        assert!(config(0).validate().is_err());
    }
}
