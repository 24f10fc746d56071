//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── command: Command        # compile, run, inspect
//! ├── engine: EngineConfig    # Database file, preview limit, staleness
//! └── log: LogConfig          # Log output format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! # Persist ingested sources and derived tables between runs
//! blockflow --database pipeline.duckdb run --pipeline p.json --source sales=sales.csv
//!
//! # Or via environment variables
//! BLOCKFLOW_DATABASE=pipeline.duckdb blockflow run --pipeline p.json
//! ```

mod engine;
mod log;
mod source;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use engine::EngineConfig;
pub use log::{LogConfig, LogFormat};
pub use source::SourceArg;

use crate::command::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "blockflow")]
#[command(about = "Compile and run block pipelines against an embedded analytical engine")]
#[command(version)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Engine and orchestration configuration.
    #[clap(flatten)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[clap(flatten)]
    pub log: LogConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that its
    /// variables act as defaults for `env`-backed options.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine
            .validate()
            .context("invalid engine configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            database = ?self.engine.database,
            preview_limit = self.engine.preview_limit,
            staleness = %self.engine.staleness,
            log_format = ?self.log.format,
            "engine configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use blockflow_runtime::prelude::StalenessPolicy;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_sources() {
        let cli = Cli::try_parse_from([
            "blockflow",
            "--preview-limit",
            "10",
            "--staleness",
            "reachability",
            "run",
            "--pipeline",
            "p.json",
            "--source",
            "sales=data/sales.csv",
            "--source",
            "costs=costs.csv",
        ])
        .unwrap();

        assert_eq!(cli.engine.preview_limit, 10);
        assert_eq!(cli.engine.staleness, StalenessPolicy::Reachability);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.sources.len(), 2);
        assert_eq!(args.sources[0].name.as_str(), "sales");
    }

    #[test]
    fn zero_preview_limit_is_invalid() {
        let cli =
            Cli::try_parse_from(["blockflow", "--preview-limit", "0", "compile", "-p", "p.json"])
                .unwrap();
        assert!(cli.validate().is_err());
    }
}
