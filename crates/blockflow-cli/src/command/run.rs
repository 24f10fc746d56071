//! `blockflow run`.

use crate::TRACING_TARGET_COMMAND;
use crate::command::{RunArgs, ingest_sources, load_session, orchestrator, output};
use crate::config::EngineConfig;

/// Ingests sources, executes every block and prints the results.
///
/// Block failures are part of the printed report; the command itself fails
/// only when the run did not succeed for every visited block.
pub async fn run(engine: &EngineConfig, args: &RunArgs) -> anyhow::Result<()> {
    let mut session = load_session(&args.pipeline, engine).await?;
    let orchestrator = orchestrator(engine)?;
    ingest_sources(&orchestrator, &args.sources).await?;

    let report = orchestrator.execute_all(&mut session).await;
    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        run_id = %report.run_id,
        duration = %report.duration(),
        "pipeline run finished"
    );

    print!("{}", output::render_run(&session, &report, args.output));

    if !report.is_success() {
        anyhow::bail!("{} block(s) failed", report.failed().len());
    }
    Ok(())
}
