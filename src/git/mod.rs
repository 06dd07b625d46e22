//! Git operations wrapper
//!
//! Cloning goes through the `git` CLI so progress streams to the terminal;
//! inspection of an existing clone uses git2 (libgit2 bindings).

use git2::Repository;
use std::path::Path;
use thiserror::Error;

use crate::process::{CommandRunner, CommandSpec, ProcessError};

/// Errors that can occur during git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Not a git repository: {0}")]
    NotARepo(String),

    #[error("git clone of {url} failed (exit code {code:?})")]
    CloneFailed { url: String, code: Option<i32> },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Reference error: {0}")]
    Reference(String),
}

/// Derive the directory name `git clone` would create for a URL.
///
/// Takes the last path segment, ignoring a trailing `/` and `.git`.
/// Works for HTTPS, SSH (`git@host:owner/repo.git`) and local paths.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() || parsed.scheme() == "file" => parsed.path().to_string(),
        _ => trimmed.to_string(),
    };
    let last = path
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()?
        .trim_end_matches(".git");
    if last.is_empty() {
        None
    } else {
        Some(last.to_string())
    }
}

/// Clone `url` into `<workdir>/<name>`.
///
/// Output streams to the terminal; a non-zero exit is an error.
pub async fn clone_repo(
    runner: &dyn CommandRunner,
    git: &str,
    url: &str,
    workdir: &Path,
    name: &str,
) -> Result<(), GitError> {
    let spec = CommandSpec::new(git)
        .args(["clone", url, name])
        .current_dir(workdir);
    let output = runner.run(&spec).await?;
    if !output.success {
        return Err(GitError::CloneFailed {
            url: url.to_string(),
            code: output.code,
        });
    }
    Ok(())
}

/// Open a git repository at the given path
pub fn open_repo<P: AsRef<Path>>(path: P) -> Result<Repository, GitError> {
    Repository::open(path.as_ref())
        .map_err(|e| GitError::NotARepo(format!("{}: {}", path.as_ref().display(), e)))
}

/// Check if a path is a git repository
pub fn is_git_repo<P: AsRef<Path>>(path: P) -> bool {
    Repository::open(path.as_ref()).is_ok()
}

/// Get the current branch name
pub fn get_current_branch(repo: &Repository) -> Result<String, GitError> {
    let head = repo
        .head()
        .map_err(|e| GitError::Reference(e.to_string()))?;

    if head.is_branch() {
        let name = head.shorthand().unwrap_or("HEAD");
        Ok(name.to_string())
    } else {
        let oid = head
            .target()
            .ok_or_else(|| GitError::Reference("HEAD has no target".to_string()))?;
        Ok(format!("(HEAD detached at {})", &oid.to_string()[..7]))
    }
}
