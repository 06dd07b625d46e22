//! GPU command implementation
//!
//! Shows per-device memory and the detected accelerated-attention model.

use serde::Serialize;

use crate::cli::context::DemoContext;
use crate::cli::output::Output;
use crate::gpu::{self, GpuError, GpuMemoryMap, GpuModel};
use crate::util::RetryOptions;

#[derive(Serialize)]
struct GpuReport {
    memory: GpuMemoryMap,
    model: Option<GpuModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsupported: Option<String>,
}

/// Run the gpu command
pub async fn run_gpu(ctx: &DemoContext, json: bool) -> anyhow::Result<()> {
    let nvidia_smi = &ctx.options.tools.nvidia_smi;
    let runner = ctx.runner.as_ref();

    let memory = match gpu::query_memory(runner, nvidia_smi).await {
        Ok(memory) => memory,
        Err(GpuError::ToolUnavailable(tool)) if !json => {
            Output::info(&format!("Not using the GPU ({} not found)", tool));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Interactive inspection does not wait on a flaky driver.
    let spinner = (!json && !ctx.quiet).then(|| Output::spinner("Detecting GPU model..."));
    let detected = gpu::detect_model(runner, nvidia_smi, &RetryOptions::none()).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let (model, unsupported) = match detected {
        Ok(model) => (Some(model), None),
        Err(GpuError::Unsupported(name)) => (None, Some(name)),
        Err(e) => return Err(e.into()),
    };

    if json {
        let report = GpuReport {
            memory,
            model,
            unsupported,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header("GPU memory (name, total, free)");
    if memory.is_empty() {
        Output::info("No devices reported");
    }
    for entry in memory.iter() {
        Output::kv(&entry.label, &entry.line);
    }

    println!();
    match (model, unsupported) {
        (Some(model), _) => Output::success(&format!(
            "Accelerated attention supported ({})",
            model
        )),
        (None, Some(name)) => Output::warning(&format!(
            "Seems that your GPU is not supported at the moment: {}",
            name
        )),
        (None, None) => {}
    }

    Ok(())
}
