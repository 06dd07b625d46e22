//! Git helper utilities for integration tests.
//!
//! Builds local bare remotes so clone tests run offline.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Run a git command, panicking with stderr on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a bare repository at `bare_path` holding one commit with `files`.
///
/// `staging` is a scratch working copy. Returns the `file://` URL of the remote.
pub fn bare_remote_with_files(staging: &Path, bare_path: &Path, files: &[(&str, &str)]) -> String {
    fs::create_dir_all(bare_path).unwrap();
    git(bare_path, &["init", "--bare"]);

    fs::create_dir_all(staging).unwrap();
    git(staging, &["init"]);
    git(staging, &["config", "user.email", "test@example.com"]);
    git(staging, &["config", "user.name", "Test User"]);
    git(staging, &["checkout", "-b", "main"]);
    for (name, content) in files {
        fs::write(staging.join(name), content).unwrap();
        git(staging, &["add", name]);
    }
    git(staging, &["commit", "-m", "Initial commit"]);

    let url = format!("file://{}", bare_path.display());
    git(staging, &["remote", "add", "origin", &url]);
    git(staging, &["push", "origin", "main"]);
    git(bare_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    url
}
