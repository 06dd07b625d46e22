//! NVIDIA GPU queries via `nvidia-smi`
//!
//! Two queries are supported: a per-device memory listing, and detection of
//! the GPU model from the summary output. Model detection only knows the
//! four models that have prebuilt accelerated-attention wheels.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use crate::util::{retry_with_backoff, RetryOptions};

/// Arguments for the memory query
pub const MEMORY_QUERY_ARGS: [&str; 2] = [
    "--query-gpu=name,memory.total,memory.free",
    "--format=csv,noheader",
];

const XFORMERS_WHEEL_BASE: &str =
    "https://github.com/TheLastBen/fast-stable-diffusion/raw/main/precompiled";
const XFORMERS_WHEEL_FILE: &str = "xformers-0.0.13.dev0-py3-none-any.whl";

/// Errors from GPU queries
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("{0} is not available on this machine")]
    ToolUnavailable(String),

    #[error("{tool} exited with code {code:?}: {stderr}")]
    QueryFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("GPU not supported for accelerated attention (supported: T4, P100, V100, A100): {0}")]
    Unsupported(String),

    #[error(transparent)]
    Process(ProcessError),
}

impl GpuError {
    /// Query failures may be transient; an unsupported model never is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GpuError::QueryFailed { .. } | GpuError::Process(_))
    }
}

/// GPU models with prebuilt accelerated-attention wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GpuModel {
    T4,
    P100,
    V100,
    A100,
}

impl GpuModel {
    /// Detection order; the first substring found wins
    pub const ALL: [GpuModel; 4] = [GpuModel::T4, GpuModel::P100, GpuModel::V100, GpuModel::A100];

    pub fn as_str(&self) -> &'static str {
        match self {
            GpuModel::T4 => "T4",
            GpuModel::P100 => "P100",
            GpuModel::V100 => "V100",
            GpuModel::A100 => "A100",
        }
    }

    /// URL of the precompiled xformers wheel for this model
    pub fn xformers_wheel_url(&self) -> String {
        format!(
            "{}/{}/{}",
            XFORMERS_WHEEL_BASE,
            self.as_str(),
            XFORMERS_WHEEL_FILE
        )
    }
}

impl fmt::Display for GpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device line from the memory query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuMemoryEntry {
    /// `gpu_<index>`
    pub label: String,
    /// Raw CSV line: `name, memory.total, memory.free`
    pub line: String,
}

/// Per-device memory listing, in device order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GpuMemoryMap {
    entries: Vec<GpuMemoryEntry>,
}

impl GpuMemoryMap {
    /// Build from `nvidia-smi --format=csv,noheader` output
    pub fn parse(stdout: &str) -> Self {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        let entries = trimmed
            .lines()
            .enumerate()
            .map(|(index, line)| GpuMemoryEntry {
                label: format!("gpu_{}", index),
                line: line.trim_end_matches('\r').to_string(),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.line.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpuMemoryEntry> {
        self.entries.iter()
    }
}

/// Find the first known model mentioned in `nvidia-smi` summary text
pub fn match_model(summary: &str) -> Option<GpuModel> {
    GpuModel::ALL
        .into_iter()
        .find(|model| summary.contains(model.as_str()))
}

async fn query(
    runner: &dyn CommandRunner,
    nvidia_smi: &str,
    args: &[&str],
) -> Result<String, GpuError> {
    let spec = CommandSpec::new(nvidia_smi).args(args.iter().copied());
    let output = runner.output(&spec).await.map_err(|e| match e {
        ProcessError::NotFound(tool) => GpuError::ToolUnavailable(tool),
        other => GpuError::Process(other),
    })?;
    if !output.success {
        return Err(GpuError::QueryFailed {
            tool: nvidia_smi.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Query name, total and free memory for every device
pub async fn query_memory(
    runner: &dyn CommandRunner,
    nvidia_smi: &str,
) -> Result<GpuMemoryMap, GpuError> {
    let stdout = query(runner, nvidia_smi, &MEMORY_QUERY_ARGS).await?;
    Ok(GpuMemoryMap::parse(&stdout))
}

/// Detect the GPU model from the `nvidia-smi` summary.
///
/// Failed queries are retried per `retry`; text naming none of the known
/// models fails at once with [`GpuError::Unsupported`].
pub async fn detect_model(
    runner: &dyn CommandRunner,
    nvidia_smi: &str,
    retry: &RetryOptions,
) -> Result<GpuModel, GpuError> {
    retry_with_backoff(retry, GpuError::is_retryable, || async move {
        let summary = query(runner, nvidia_smi, &[]).await?;
        match_model(&summary).ok_or_else(|| GpuError::Unsupported(describe_unknown(&summary)))
    })
    .await
}

/// Pull the device name out of an unrecognised summary for the error message
fn describe_unknown(summary: &str) -> String {
    summary
        .lines()
        .find(|line| line.contains("NVIDIA") || line.contains("Tesla"))
        .map(|line| line.trim_matches(|c: char| c == '|' || c.is_whitespace()).to_string())
        .unwrap_or_else(|| "no recognised GPU in nvidia-smi output".to_string())
}
