//! Install command implementation

use std::path::Path;

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::core::handler::RepoHandler;

/// Run the install command
pub async fn run_install(
    ctx: &DemoContext,
    url: &str,
    requirements: Option<&Path>,
    accelerated_attention: bool,
) -> anyhow::Result<()> {
    let handler = ctx.open(url)?;
    install_with(&handler, requirements, accelerated_attention).await
}

/// Install through an existing handler (shared with `up`)
pub async fn install_with(
    handler: &RepoHandler,
    requirements: Option<&Path>,
    accelerated_attention: bool,
) -> anyhow::Result<()> {
    Output::header(&format!(
        "Installing requirements for {}...",
        Output::repo_name(handler.repo_name())
    ));

    match handler
        .install_dependencies(requirements, accelerated_attention)
        .await?
    {
        Some(model) => Output::success(&format!(
            "Requirements installed, with xformers for {}",
            model
        )),
        None => Output::success("Requirements installed"),
    }

    Ok(())
}
