//! Subcommands.

mod compile;
mod inspect;
mod output;
mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;
use blockflow_duckdb::DuckDbEngine;
use blockflow_runtime::prelude::{Orchestrator, PipelineDefinition, Session};
use clap::{Args, Subcommand};
pub use output::OutputFormat;

use crate::TRACING_TARGET_COMMAND;
use crate::config::{Cli, EngineConfig, SourceArg};

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the SQL script a pipeline compiles to, without running it.
    Compile(CompileArgs),
    /// Ingest sources, run every block and print results.
    Run(RunArgs),
    /// Ingest sources and print their inferred schemas.
    Inspect(InspectArgs),
}

/// Arguments of `blockflow compile`.
#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// Pipeline definition (JSON).
    #[arg(long, short)]
    pub pipeline: PathBuf,

    /// Output format.
    #[arg(long, short, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// Arguments of `blockflow run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Pipeline definition (JSON).
    #[arg(long, short)]
    pub pipeline: PathBuf,

    /// CSV file to register as a source table, as `name=path`. Repeatable.
    #[arg(long = "source", short)]
    pub sources: Vec<SourceArg>,

    /// Output format.
    #[arg(long, short, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// Arguments of `blockflow inspect`.
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// CSV file to register as a source table, as `name=path`. Repeatable.
    #[arg(long = "source", short, required = true)]
    pub sources: Vec<SourceArg>,

    /// Output format.
    #[arg(long, short, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// Runs the selected subcommand.
pub async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Compile(args) => compile::compile(&cli.engine, args).await,
        Command::Run(args) => run::run(&cli.engine, args).await,
        Command::Inspect(args) => inspect::inspect(&cli.engine, args).await,
    }
}

/// Reads a pipeline definition into a new session.
async fn load_session(path: &Path, engine: &EngineConfig) -> anyhow::Result<Session> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read pipeline {}", path.display()))?;
    let definition = PipelineDefinition::from_json(&json)
        .with_context(|| format!("failed to parse pipeline {}", path.display()))?;
    let session = Session::from_definition(&definition)
        .with_context(|| format!("invalid pipeline {}", path.display()))?
        .with_staleness(engine.staleness);

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        pipeline = %path.display(),
        name = ?session.metadata().name,
        blocks = session.graph().len(),
        "pipeline loaded"
    );
    Ok(session)
}

/// Opens the engine and wraps it in an orchestrator.
fn orchestrator(engine: &EngineConfig) -> anyhow::Result<Orchestrator<DuckDbEngine>> {
    let config = engine.orchestrator_config()?;
    Ok(Orchestrator::new(engine.open_engine()?, config))
}

/// Registers every source with the engine, in argument order.
async fn ingest_sources(
    orchestrator: &Orchestrator<DuckDbEngine>,
    sources: &[SourceArg],
) -> anyhow::Result<Vec<output::SourceSchema>> {
    let mut schemas = Vec::with_capacity(sources.len());
    for source in sources {
        let content = source.read().await?;
        let columns = orchestrator
            .ingest(&source.name, &content)
            .await
            .with_context(|| format!("failed to ingest {}", source.path.display()))?;

        schemas.push(output::SourceSchema {
            table: source.name.clone(),
            columns,
        });
    }
    Ok(schemas)
}
