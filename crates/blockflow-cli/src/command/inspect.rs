//! `blockflow inspect`.

use crate::command::{InspectArgs, ingest_sources, orchestrator, output};
use crate::config::EngineConfig;

/// Ingests sources and prints their inferred schemas.
pub async fn inspect(engine: &EngineConfig, args: &InspectArgs) -> anyhow::Result<()> {
    let orchestrator = orchestrator(engine)?;
    let schemas = ingest_sources(&orchestrator, &args.sources).await?;

    print!("{}", output::render_schemas(&schemas, args.output));
    Ok(())
}
