//! Launch command implementation
//!
//! Starts the demo and, unless detached, keeps it in the foreground until
//! it exits or Ctrl-C is pressed.

use colored::Colorize;

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::core::handler::{LaunchOutcome, LaunchReport, RepoHandler, StopOutcome};
use crate::core::state::LaunchState;
use crate::process::DemoProcess;

/// Run the launch command
pub async fn run_launch(
    ctx: &DemoContext,
    url: &str,
    cloud_domain: Option<&str>,
    cloud_region: Option<&str>,
    detach: bool,
) -> anyhow::Result<()> {
    let handler = ctx.open(url)?;
    launch_with(&handler, cloud_domain, cloud_region, detach).await
}

/// Launch through an existing handler (shared with `up`)
pub async fn launch_with(
    handler: &RepoHandler,
    cloud_domain: Option<&str>,
    cloud_region: Option<&str>,
    detach: bool,
) -> anyhow::Result<()> {
    let report = handler.run_demo(cloud_domain, cloud_region).await?;
    print_report(&report);

    match report.outcome {
        LaunchOutcome::Launched(process) => supervise(handler, process, detach).await,
        LaunchOutcome::Unsupported(sdk) => {
            Output::warning(&format!(
                "This tool will not work with static apps hosted on \"Spaces\" (sdk: {})",
                sdk
            ));
            Ok(())
        }
    }
}

fn print_report(report: &LaunchReport) {
    match report.gpu {
        Some(ref map) => {
            Output::header("GPU memory (name, total, free)");
            for entry in map.iter() {
                Output::kv(&entry.label, &entry.line);
            }
        }
        None => Output::info("Not using the GPU"),
    }

    if let Some(StopOutcome::Stopped { pid }) = report.stopped_previous {
        Output::info(&format!("Closed the previously running demo (pid {})", pid));
    }

    Output::header(&format!("Demo: {}", report.title));
    println!("Wait a few seconds, then click the link below to open your application:");
    if let Some(ref url) = report.access_url {
        println!("{}", Output::link(url, url).bold());
    }
}

async fn supervise(
    handler: &RepoHandler,
    mut process: DemoProcess,
    detach: bool,
) -> anyhow::Result<()> {
    Output::command(&process.command().to_string());

    if detach {
        match process.pid() {
            Some(pid) => Output::success(&format!("Demo running in the background (pid {})", pid)),
            None => Output::success("Demo running in the background"),
        }
        return Ok(());
    }

    let state_path = LaunchState::path_for(&handler.repo_path());
    tokio::select! {
        exit = process.wait() => {
            LaunchState::remove(&state_path)?;
            match exit? {
                Some(status) if !status.success => {
                    anyhow::bail!("Demo exited with code {:?}", status.code);
                }
                _ => Output::info("Demo exited"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            process.kill().await?;
            LaunchState::remove(&state_path)?;
            println!();
            Output::info("Demo stopped");
        }
    }

    Ok(())
}
