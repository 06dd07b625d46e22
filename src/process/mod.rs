//! External process execution
//!
//! Every tool demogrip drives (git, pip, nvidia-smi, python, streamlit) is
//! described as a [`CommandSpec`] and executed through a [`CommandRunner`].
//! [`SystemRunner`] runs real processes on the tokio runtime; tests swap in
//! a recording runner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Child;

use crate::util::log_cmd;

/// Errors raised while starting or waiting on a process
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, inherited when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Look up an environment override by name
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a live process command line (as printed by `ps -o args=`)
    /// was started from this spec.
    ///
    /// Interpreters may prefix the line (`python3 /usr/bin/streamlit ...`),
    /// so the program only has to name one of the words by file name and
    /// every recorded argument has to follow it, in order.
    pub fn matches_command_line(&self, line: &str) -> bool {
        let program = file_name(&self.program);
        let mut words = line.split_whitespace();
        if !words.by_ref().any(|word| file_name(word) == program) {
            return false;
        }
        self.args
            .iter()
            .all(|arg| words.by_ref().any(|word| word == arg))
    }

    fn to_command(&self) -> tokio::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        log_cmd(&cmd);
        tokio::process::Command::from(cmd)
    }

    fn spawn_error(&self, e: std::io::Error) -> ProcessError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProcessError::NotFound(self.program.clone())
        } else {
            ProcessError::Spawn {
                program: self.program.clone(),
                source: e,
            }
        }
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Renders as a shell-style line, e.g. `GRADIO_SERVER_PORT=6006 python app.py`
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    /// Captured stdout (empty when stdio was inherited)
    pub stdout: String,
    /// Captured stderr (empty when stdio was inherited)
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Handle to a launched demo server.
///
/// Holds the child process when the runner produced one, so the caller can
/// poll, wait on, or terminate the server.
#[derive(Debug)]
pub struct DemoProcess {
    command: CommandSpec,
    pid: Option<u32>,
    child: Option<Child>,
}

impl DemoProcess {
    pub fn new(command: CommandSpec, child: Child) -> Self {
        Self {
            command,
            pid: child.id(),
            child: Some(child),
        }
    }

    /// A handle without a live child (used by runners that do not own the process)
    pub fn detached(command: CommandSpec, pid: Option<u32>) -> Self {
        Self {
            command,
            pid,
            child: None,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Whether this handle owns the child process
    pub fn has_child(&self) -> bool {
        self.child.is_some()
    }

    /// Exit code if the server has stopped, `None` while it is running
    pub fn try_exit(&mut self) -> Result<Option<CommandOutput>, ProcessError> {
        match self.child.as_mut() {
            Some(child) => Ok(child.try_wait()?.map(|status| CommandOutput {
                code: status.code(),
                success: status.success(),
                ..Default::default()
            })),
            None => Ok(None),
        }
    }

    /// Wait for the server to exit
    pub async fn wait(&mut self) -> Result<Option<CommandOutput>, ProcessError> {
        match self.child.as_mut() {
            Some(child) => {
                let status = child.wait().await?;
                Ok(Some(CommandOutput {
                    code: status.code(),
                    success: status.success(),
                    ..Default::default()
                }))
            }
            None => Ok(None),
        }
    }

    /// Terminate the server
    pub async fn kill(&mut self) -> Result<(), ProcessError> {
        if let Some(child) = self.child.as_mut() {
            child.kill().await?;
        }
        Ok(())
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with the terminal attached (output streams to the user)
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;

    /// Run to completion capturing stdout and stderr
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;

    /// Start a long-lived process and return without waiting for it
    async fn spawn(&self, spec: &CommandSpec) -> Result<DemoProcess, ProcessError>;
}

/// Runs real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let status = spec
            .to_command()
            .status()
            .await
            .map_err(|e| spec.spawn_error(e))?;
        Ok(CommandOutput {
            code: status.code(),
            success: status.success(),
            ..Default::default()
        })
    }

    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spec.spawn_error(e))?;
        Ok(output.into())
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<DemoProcess, ProcessError> {
        let child = spec
            .to_command()
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| spec.spawn_error(e))?;
        Ok(DemoProcess::new(spec.clone(), child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_env_and_args() {
        let spec = CommandSpec::new("python")
            .arg("app.py")
            .env("GRADIO_SERVER_PORT", "6006");
        assert_eq!(spec.to_string(), "GRADIO_SERVER_PORT=6006 python app.py");
        assert_eq!(spec.env_value("GRADIO_SERVER_PORT"), Some("6006"));
        assert_eq!(spec.env_value("PATH"), None);
    }

    #[test]
    fn test_matches_command_line() {
        let gradio = CommandSpec::new("python")
            .arg("app.py")
            .env("GRADIO_SERVER_PORT", "6006");
        assert!(gradio.matches_command_line("python app.py"));
        assert!(gradio.matches_command_line("/usr/bin/python app.py"));
        assert!(!gradio.matches_command_line("sleep 30"));
        assert!(!gradio.matches_command_line("python other.py"));
        assert!(!gradio.matches_command_line(""));

        let streamlit = CommandSpec::new("streamlit").args(["run", "main.py", "--server.port", "6006"]);
        assert!(streamlit.matches_command_line(
            "/usr/bin/python3 /usr/local/bin/streamlit run main.py --server.port 6006"
        ));
        assert!(!streamlit.matches_command_line("streamlit run main.py --server.port 8501"));
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let spec = CommandSpec::new("definitely-not-a-real-program-demogrip");
        let err = SystemRunner.output(&spec).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotFound(ref p) if p.contains("demogrip")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_captures_stdout() {
        let spec = CommandSpec::new("sh").args(["-c", "echo hello"]);
        let output = SystemRunner.output(&spec).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_reports_failure_code() {
        let spec = CommandSpec::new("sh").args(["-c", "exit 3"]);
        let output = SystemRunner.output(&spec).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_returns_live_handle() {
        let spec = CommandSpec::new("sleep").arg("5");
        let mut process = SystemRunner.spawn(&spec).await.unwrap();
        assert!(process.pid().is_some());
        assert!(process.try_exit().unwrap().is_none());
        process.kill().await.unwrap();
        let exit = process.wait().await.unwrap().unwrap();
        assert!(!exit.success);
    }

    #[tokio::test]
    async fn test_detached_handle_has_no_child() {
        let mut process = DemoProcess::detached(CommandSpec::new("python"), Some(42));
        assert_eq!(process.pid(), Some(42));
        assert!(!process.has_child());
        assert!(process.try_exit().unwrap().is_none());
        assert!(process.wait().await.unwrap().is_none());
        process.kill().await.unwrap();
    }
}
