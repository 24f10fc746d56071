//! `blockflow compile`.

use crate::TRACING_TARGET_COMMAND;
use crate::command::{CompileArgs, load_session, output};
use crate::config::EngineConfig;

/// Prints the SQL script of a pipeline without touching an engine.
pub async fn compile(engine: &EngineConfig, args: &CompileArgs) -> anyhow::Result<()> {
    let session = load_session(&args.pipeline, engine).await?;
    let plan = session.compile_plan();

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        compiled = plan.blocks.len(),
        skipped = plan.skipped.len(),
        "pipeline compiled"
    );

    print!("{}", output::render_plan(&session, &plan, args.output));
    Ok(())
}
