//! Demo repository handler
//!
//! [`RepoHandler`] drives the whole workflow for one demo repository:
//! clone it, read its manifest, install its dependencies, and launch its
//! web demo on [`DEMO_PORT`]. Every external tool runs through the
//! handler's [`CommandRunner`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::{DemoConfig, ToolConfig};
use crate::core::host::HostEnvironment;
use crate::core::manifest::{DemoManifest, ManifestError, Sdk, MANIFEST_FILE};
use crate::core::state::{LaunchState, StateError};
use crate::git::{self, GitError};
use crate::gpu::{self, GpuError, GpuMemoryMap, GpuModel};
use crate::pip::{self, InstallError};
use crate::process::{CommandRunner, CommandSpec, DemoProcess, ProcessError, SystemRunner};
use crate::util::RetryOptions;

/// Port every demo is served on
pub const DEMO_PORT: u16 = 6006;

/// Default requirements file at the repository root
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Errors from handler operations
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Cannot derive a repository name from URL: {0}")]
    InvalidUrl(String),

    #[error("The repo '{0}' has not been cloned yet")]
    NotCloned(String),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings shared by every operation of a handler
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Directory the repository is cloned into
    pub workdir: PathBuf,
    pub host: HostEnvironment,
    pub tools: ToolConfig,
    pub gpu_retry: RetryOptions,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            host: HostEnvironment::default(),
            tools: ToolConfig::default(),
            gpu_retry: RetryOptions::default(),
        }
    }
}

impl HandlerOptions {
    /// Options from a loaded config, falling back to defaults
    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            workdir: config.workdir.clone().unwrap_or_else(|| PathBuf::from(".")),
            host: config.host.unwrap_or_default(),
            tools: config.tools.clone(),
            gpu_retry: config.gpu_detection.clone(),
        }
    }
}

/// What `clone` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    Cloned,
    AlreadyCloned,
}

/// Result of `clone`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneReport {
    pub outcome: CloneOutcome,
    /// An existing checkout was deleted first
    pub removed_existing: bool,
    /// Deleting the existing checkout failed; reported, not raised
    pub removal_error: Option<String>,
}

/// What `run_demo` did
#[derive(Debug)]
pub enum LaunchOutcome {
    /// The server was started
    Launched(DemoProcess),
    /// The manifest declares an SDK that cannot be served (e.g. `static`)
    Unsupported(Sdk),
}

/// Result of `run_demo`
#[derive(Debug)]
pub struct LaunchReport {
    pub title: String,
    /// Per-device memory when an NVIDIA GPU is usable
    pub gpu: Option<GpuMemoryMap>,
    /// Studio Lab proxy URL, when domain and region were given
    pub access_url: Option<String>,
    /// What happened to a previously launched demo, `None` when nothing was launched
    pub stopped_previous: Option<StopOutcome>,
    pub outcome: LaunchOutcome,
}

/// Result of `stop_demo`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No demo was recorded
    NotRunning,
    /// The recorded demo was terminated
    Stopped { pid: u32 },
    /// The recorded demo had already exited (or had no pid)
    AlreadyExited { pid: Option<u32> },
}

/// Build the SageMaker Studio Lab proxy URL for the demo port
pub fn cloud_url(domain: &str, region: &str) -> String {
    format!(
        "https://{}.studio.{}.sagemaker.aws/studiolab/default/jupyter/proxy/{}/",
        domain, region, DEMO_PORT
    )
}

/// Handles one demo repository
pub struct RepoHandler {
    repo_url: String,
    repo_name: String,
    options: HandlerOptions,
    runner: Arc<dyn CommandRunner>,
}

impl RepoHandler {
    pub fn new(
        repo_url: &str,
        options: HandlerOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, HandlerError> {
        let repo_name = git::repo_name_from_url(repo_url)
            .ok_or_else(|| HandlerError::InvalidUrl(repo_url.to_string()))?;
        debug!(%repo_url, %repo_name, host = %options.host, "created handler");
        Ok(Self {
            repo_url: repo_url.to_string(),
            repo_name,
            options,
            runner,
        })
    }

    /// Handler that runs real processes
    pub fn with_system_runner(repo_url: &str, options: HandlerOptions) -> Result<Self, HandlerError> {
        Self::new(repo_url, options, Arc::new(SystemRunner))
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn host(&self) -> HostEnvironment {
        self.options.host
    }

    /// Local checkout directory
    pub fn repo_path(&self) -> PathBuf {
        self.options.workdir.join(&self.repo_name)
    }

    pub fn is_cloned(&self) -> bool {
        self.repo_path().exists()
    }

    /// Clone the repository, optionally replacing an existing checkout
    pub async fn clone(&self, overwrite: bool) -> Result<CloneReport, HandlerError> {
        let path = self.repo_path();
        let mut removed_existing = false;
        let mut removal_error = None;

        if overwrite && path.exists() {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "removed existing checkout");
                    removed_existing = true;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove existing checkout");
                    removal_error = Some(format!("{} - {}", path.display(), e));
                }
            }
        }

        if path.exists() {
            return Ok(CloneReport {
                outcome: CloneOutcome::AlreadyCloned,
                removed_existing,
                removal_error,
            });
        }

        std::fs::create_dir_all(&self.options.workdir)?;
        git::clone_repo(
            self.runner.as_ref(),
            &self.options.tools.git,
            &self.repo_url,
            &self.options.workdir,
            &self.repo_name,
        )
        .await?;

        Ok(CloneReport {
            outcome: CloneOutcome::Cloned,
            removed_existing,
            removal_error,
        })
    }

    /// Read a manifest file. A missing file yields an empty manifest.
    pub fn read_manifest(&self, path: &Path) -> Result<DemoManifest, HandlerError> {
        match DemoManifest::load(path) {
            Ok(manifest) => Ok(manifest),
            Err(ManifestError::Missing(path)) => {
                warn!(path = %path.display(), "No '{}' file", MANIFEST_FILE);
                Ok(DemoManifest::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the repository's manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.repo_path().join(MANIFEST_FILE)
    }

    /// The repository's manifest, or `None` if the repo is not cloned yet
    pub fn describe(&self) -> Result<Option<DemoManifest>, HandlerError> {
        if !self.is_cloned() {
            return Ok(None);
        }
        self.read_manifest(&self.manifest_path()).map(Some)
    }

    /// Install the repository's Python requirements.
    ///
    /// With `accelerated_attention`, also installs triton and the xformers
    /// wheel built for the detected GPU, returning that GPU model.
    pub async fn install_dependencies(
        &self,
        requirements: Option<&Path>,
        accelerated_attention: bool,
    ) -> Result<Option<GpuModel>, HandlerError> {
        let requirements = requirements
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo_path().join(REQUIREMENTS_FILE));
        let pip_bin = &self.options.tools.pip;

        pip::install_requirements(self.runner.as_ref(), pip_bin, &requirements).await?;

        if !accelerated_attention {
            return Ok(None);
        }

        pip::install_triton(self.runner.as_ref(), pip_bin).await?;
        let model = self.detect_gpu_model().await?;
        info!(%model, "installing precompiled xformers");
        pip::install_wheel(self.runner.as_ref(), pip_bin, &model.xformers_wheel_url()).await?;
        Ok(Some(model))
    }

    /// Launch the repository's web demo on [`DEMO_PORT`].
    ///
    /// The manifest must name a `title` and an `sdk`; nothing is started
    /// otherwise. A new demo replaces any demo previously started here.
    pub async fn run_demo(
        &self,
        cloud_domain: Option<&str>,
        cloud_region: Option<&str>,
    ) -> Result<LaunchReport, HandlerError> {
        if !self.is_cloned() {
            return Err(HandlerError::NotCloned(self.repo_name.clone()));
        }

        let gpu = match self.query_gpu_memory().await {
            Ok(map) if !map.is_empty() => Some(map),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "no usable GPU");
                None
            }
        };

        let manifest = self.read_manifest(&self.manifest_path())?;
        let title = manifest.title()?.to_string();
        let sdk = manifest.sdk()?;

        let access_url = match (cloud_domain, cloud_region) {
            (Some(domain), Some(region)) => Some(cloud_url(domain, region)),
            (None, None) => None,
            _ => {
                debug!("cloud domain and region must both be set to build an access URL");
                None
            }
        };

        let repo_path = self.repo_path();
        let port = DEMO_PORT.to_string();
        let spec = match sdk {
            Sdk::Gradio => CommandSpec::new(&self.options.tools.python)
                .arg(manifest.app_file()?)
                .current_dir(&repo_path)
                .env("GRADIO_SERVER_PORT", port.as_str()),
            Sdk::Streamlit => CommandSpec::new(&self.options.tools.streamlit)
                .args(["run", manifest.app_file()?, "--server.port", port.as_str()])
                .current_dir(&repo_path),
            Sdk::Other(_) => {
                return Ok(LaunchReport {
                    title,
                    gpu,
                    access_url,
                    stopped_previous: None,
                    outcome: LaunchOutcome::Unsupported(sdk),
                });
            }
        };

        // Both SDKs serve on the same port
        let stopped_previous = self.stop_demo().await?;

        let mut process = self.runner.spawn(&spec).await?;
        info!(pid = ?process.pid(), command = %spec, "demo started");

        let state = LaunchState::new(process.pid(), &sdk, manifest.app_file()?, DEMO_PORT, spec);
        if let Err(e) = state.save(&LaunchState::path_for(&repo_path)) {
            self.terminate(&mut process).await;
            return Err(e.into());
        }

        Ok(LaunchReport {
            title,
            gpu,
            access_url,
            stopped_previous: Some(stopped_previous),
            outcome: LaunchOutcome::Launched(process),
        })
    }

    /// Stop the demo recorded by a previous launch
    pub async fn stop_demo(&self) -> Result<StopOutcome, HandlerError> {
        let state_path = LaunchState::path_for(&self.repo_path());
        let Some(state) = LaunchState::load(&state_path)? else {
            return Ok(StopOutcome::NotRunning);
        };

        let live_pid = match state.pid {
            Some(pid) => Some((pid, self.is_recorded_demo(pid, &state.command).await)),
            None => None,
        };

        let outcome = match live_pid {
            Some((pid, false)) => {
                debug!(pid, command = %state.command, "recorded demo is no longer running");
                StopOutcome::AlreadyExited { pid: Some(pid) }
            }
            Some((pid, true)) => {
                let output = self.runner.output(&kill_command(pid)).await?;
                if output.success {
                    info!(pid, "stopped demo");
                    StopOutcome::Stopped { pid }
                } else {
                    debug!(pid, stderr = %output.stderr.trim(), "demo already exited");
                    StopOutcome::AlreadyExited { pid: Some(pid) }
                }
            }
            None => StopOutcome::AlreadyExited { pid: None },
        };

        LaunchState::remove(&state_path)?;
        Ok(outcome)
    }

    /// Whether `pid` still runs `command`. A pid reused by another process,
    /// or one that cannot be inspected, is never signalled.
    async fn is_recorded_demo(&self, pid: u32, command: &CommandSpec) -> bool {
        match self.runner.output(&command_line_query(pid)).await {
            Ok(output) if output.success => command.matches_command_line(output.stdout.trim()),
            Ok(_) => false,
            Err(e) => {
                warn!(pid, error = %e, "cannot inspect the recorded demo process");
                false
            }
        }
    }

    /// Best-effort termination of a demo that could not be recorded
    async fn terminate(&self, process: &mut DemoProcess) {
        let result = if process.has_child() {
            process.kill().await
        } else if let Some(pid) = process.pid() {
            self.runner.output(&kill_command(pid)).await.map(|_| ())
        } else {
            Ok(())
        };
        if let Err(e) = result {
            warn!(pid = ?process.pid(), error = %e, "failed to stop unrecorded demo");
        }
    }

    /// Per-device name, total and free memory
    pub async fn query_gpu_memory(&self) -> Result<GpuMemoryMap, GpuError> {
        gpu::query_memory(self.runner.as_ref(), &self.options.tools.nvidia_smi).await
    }

    /// Detect which supported GPU model is installed
    pub async fn detect_gpu_model(&self) -> Result<GpuModel, GpuError> {
        gpu::detect_model(
            self.runner.as_ref(),
            &self.options.tools.nvidia_smi,
            &self.options.gpu_retry,
        )
        .await
    }
}

#[cfg(unix)]
fn kill_command(pid: u32) -> CommandSpec {
    CommandSpec::new("kill").arg(pid.to_string())
}

#[cfg(windows)]
fn kill_command(pid: u32) -> CommandSpec {
    CommandSpec::new("taskkill").args(["/PID".to_string(), pid.to_string(), "/F".to_string()])
}

#[cfg(unix)]
fn command_line_query(pid: u32) -> CommandSpec {
    CommandSpec::new("ps").args(["-o", "args=", "-p"]).arg(pid.to_string())
}

#[cfg(windows)]
fn command_line_query(pid: u32) -> CommandSpec {
    CommandSpec::new("powershell").args([
        "-NoProfile".to_string(),
        "-Command".to_string(),
        format!(
            "(Get-CimInstance Win32_Process -Filter 'ProcessId={}').CommandLine",
            pid
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_url() {
        assert_eq!(
            cloud_url("abc123", "us-east-2"),
            "https://abc123.studio.us-east-2.sagemaker.aws/studiolab/default/jupyter/proxy/6006/"
        );
    }

    #[test]
    fn test_new_derives_name_and_path() {
        let options = HandlerOptions {
            workdir: PathBuf::from("/content"),
            ..Default::default()
        };
        let handler =
            RepoHandler::with_system_runner("https://huggingface.co/spaces/acme/demo", options)
                .unwrap();
        assert_eq!(handler.repo_name(), "demo");
        assert_eq!(handler.repo_path(), PathBuf::from("/content/demo"));
        assert_eq!(handler.host(), HostEnvironment::Other);
    }

    #[test]
    fn test_new_rejects_unnamed_url() {
        let result = RepoHandler::with_system_runner("https://example.com/", Default::default());
        assert!(matches!(result, Err(HandlerError::InvalidUrl(_))));
    }

    #[test]
    fn test_options_from_config() {
        let config = DemoConfig {
            host: Some(HostEnvironment::Colab),
            workdir: Some(PathBuf::from("/content")),
            ..Default::default()
        };
        let options = HandlerOptions::from_config(&config);
        assert_eq!(options.host, HostEnvironment::Colab);
        assert_eq!(options.workdir, PathBuf::from("/content"));
        assert_eq!(options.tools.git, "git");
    }
}
