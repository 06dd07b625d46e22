//! Clone command implementation

use dialoguer::{theme::ColorfulTheme, Confirm};
use std::io::IsTerminal;

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::core::handler::{CloneOutcome, RepoHandler};

/// Run the clone command
pub async fn run_clone(
    ctx: &DemoContext,
    url: &str,
    overwrite: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let handler = ctx.open(url)?;
    clone_with(&handler, overwrite, yes).await
}

/// Clone through an existing handler (shared with `up`)
pub async fn clone_with(handler: &RepoHandler, overwrite: bool, yes: bool) -> anyhow::Result<()> {
    let mut overwrite = overwrite;
    if overwrite && handler.is_cloned() && !yes && std::io::stdin().is_terminal() {
        overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete {} and clone it again?",
                handler.repo_path().display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            Output::info("Keeping the existing checkout");
        }
    }

    let report = handler.clone(overwrite).await?;

    if let Some(ref err) = report.removal_error {
        Output::error(&format!("Error: {}", err));
    }

    match report.outcome {
        CloneOutcome::AlreadyCloned => {
            Output::info(&format!(
                "Repository {} has already been cloned.",
                Output::repo_name(handler.repo_name())
            ));
        }
        CloneOutcome::Cloned => {
            Output::success(&format!(
                "Cloned {} into {}",
                Output::repo_name(handler.repo_name()),
                handler.repo_path().display()
            ));
        }
    }

    Ok(())
}
