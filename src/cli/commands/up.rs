//! Up command implementation
//!
//! Clone, install and launch in one go.

use std::path::Path;

use crate::cli::commands::{clone::clone_with, install::install_with, launch::launch_with};
use crate::cli::context::DemoContext;

/// Options for the up command
#[derive(Debug, Default, Clone)]
pub struct UpOptions<'a> {
    pub overwrite: bool,
    pub yes: bool,
    pub requirements: Option<&'a Path>,
    pub accelerated_attention: bool,
    pub cloud_domain: Option<&'a str>,
    pub cloud_region: Option<&'a str>,
    pub detach: bool,
}

/// Run the up command
pub async fn run_up(ctx: &DemoContext, url: &str, opts: &UpOptions<'_>) -> anyhow::Result<()> {
    let handler = ctx.open(url)?;

    clone_with(&handler, opts.overwrite, opts.yes).await?;
    install_with(&handler, opts.requirements, opts.accelerated_attention).await?;
    launch_with(&handler, opts.cloud_domain, opts.cloud_region, opts.detach).await
}
