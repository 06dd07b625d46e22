//! Command logging utilities for verbose output.

use std::process::Command;
use tracing::debug;

/// Log a command just before execution.
///
/// Emits a `tracing::debug!` event with the program name, arguments,
/// working directory and any environment overrides. Visible when running
/// with `--verbose` (which sets `demogrip=debug`) or via
/// `RUST_LOG=demogrip::cmd=debug`.
pub fn log_cmd(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
    let cwd = cmd
        .get_current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let envs: Vec<_> = cmd
        .get_envs()
        .filter_map(|(k, v)| v.map(|v| format!("{}={}", k.to_string_lossy(), v.to_string_lossy())))
        .collect();
    debug!(
        target: "demogrip::cmd",
        %program,
        ?args,
        %cwd,
        ?envs,
        "exec"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_cmd_does_not_panic_without_subscriber() {
        let mut cmd = Command::new("python");
        cmd.arg("app.py")
            .env("GRADIO_SERVER_PORT", "6006")
            .current_dir("/tmp");
        log_cmd(&cmd);
    }
}
