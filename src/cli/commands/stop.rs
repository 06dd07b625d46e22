//! Stop command implementation

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::core::handler::StopOutcome;

/// Run the stop command
pub async fn run_stop(ctx: &DemoContext, url: &str) -> anyhow::Result<()> {
    let handler = ctx.open(url)?;

    match handler.stop_demo().await? {
        StopOutcome::NotRunning => Output::info(&format!(
            "No demo recorded for {}",
            Output::repo_name(handler.repo_name())
        )),
        StopOutcome::Stopped { pid } => Output::success(&format!("Stopped demo (pid {})", pid)),
        StopOutcome::AlreadyExited { .. } => Output::info("Demo had already exited"),
    }

    Ok(())
}
