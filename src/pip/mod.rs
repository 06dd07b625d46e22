//! Python package installation via `pip`

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::process::{CommandRunner, CommandSpec, ProcessError};

/// Errors from dependency installation
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Requirements file not found: {0}")]
    RequirementsNotFound(PathBuf),

    #[error("`{command}` failed (exit code {code:?})")]
    Failed { command: String, code: Option<i32> },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

async fn pip(runner: &dyn CommandRunner, spec: CommandSpec) -> Result<(), InstallError> {
    let output = runner.run(&spec).await?;
    if !output.success {
        return Err(InstallError::Failed {
            command: spec.to_string(),
            code: output.code,
        });
    }
    Ok(())
}

/// `pip install -r <requirements>`
pub async fn install_requirements(
    runner: &dyn CommandRunner,
    pip_bin: &str,
    requirements: &Path,
) -> Result<(), InstallError> {
    if !requirements.is_file() {
        return Err(InstallError::RequirementsNotFound(requirements.to_path_buf()));
    }
    let spec = CommandSpec::new(pip_bin)
        .args(["install", "-r"])
        .arg(requirements.to_string_lossy());
    pip(runner, spec).await
}

/// `pip install -U --pre triton`
pub async fn install_triton(runner: &dyn CommandRunner, pip_bin: &str) -> Result<(), InstallError> {
    let spec = CommandSpec::new(pip_bin).args(["install", "-U", "--pre", "triton"]);
    pip(runner, spec).await
}

/// `pip install -q <wheel>`
pub async fn install_wheel(
    runner: &dyn CommandRunner,
    pip_bin: &str,
    wheel: &str,
) -> Result<(), InstallError> {
    let spec = CommandSpec::new(pip_bin).args(["install", "-q", wheel]);
    pip(runner, spec).await
}
