//! Info command implementation
//!
//! Shows the demo manifest of a cloned repository.

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::git::{get_current_branch, open_repo};

/// Run the info command
pub fn run_info(ctx: &DemoContext, url: &str, json: bool) -> anyhow::Result<()> {
    let handler = if json {
        ctx.open_silent(url)?
    } else {
        ctx.open(url)?
    };

    let Some(manifest) = handler.describe()? else {
        if json {
            println!("null");
        } else {
            Output::warning(&format!(
                "The repo '{}' has not been cloned yet.",
                handler.repo_name()
            ));
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    Output::header(&Output::repo_name(handler.repo_name()));
    Output::kv("url", handler.repo_url());
    Output::kv("path", &handler.repo_path().display().to_string());
    if let Ok(repo) = open_repo(handler.repo_path()) {
        if let Ok(branch) = get_current_branch(&repo) {
            Output::kv("branch", &branch);
        }
    }

    if manifest.is_empty() {
        Output::info("Manifest has no entries");
        return Ok(());
    }

    println!();
    for (key, value) in manifest.iter() {
        Output::kv(key, value);
    }

    Ok(())
}
