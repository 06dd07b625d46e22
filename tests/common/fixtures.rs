//! Test fixtures for demo repository tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use demogrip::core::handler::{HandlerOptions, RepoHandler};
use demogrip::util::RetryOptions;

use super::mock_runner::MockRunner;

pub const DEMO_URL: &str = "https://huggingface.co/spaces/acme/hello-demo";
pub const DEMO_NAME: &str = "hello-demo";

pub const GRADIO_README: &str = "---\ntitle: Hello Demo\nemoji: 🚀\nsdk: gradio\napp_file: app.py\n---\n\n# Hello\n";
pub const STREAMLIT_README: &str = "---\ntitle: Charts\nsdk: streamlit\napp_file: main.py\n---\n";
pub const STATIC_README: &str = "---\ntitle: Static Page\nsdk: static\n---\n";

/// A temporary workdir holding an already-cloned demo repository
pub struct DemoRepo {
    pub _temp: TempDir,
    pub workdir: PathBuf,
    pub repo_path: PathBuf,
}

/// Builder for a demo checkout inside a temporary workdir
pub struct DemoRepoBuilder {
    name: String,
    files: Vec<(String, String)>,
    cloned: bool,
}

impl DemoRepoBuilder {
    pub fn new() -> Self {
        Self {
            name: DEMO_NAME.to_string(),
            files: Vec::new(),
            cloned: true,
        }
    }

    pub fn readme(self, content: &str) -> Self {
        self.file("README.md", content)
    }

    pub fn requirements(self, content: &str) -> Self {
        self.file("requirements.txt", content)
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    /// Leave the repository directory absent
    pub fn not_cloned(mut self) -> Self {
        self.cloned = false;
        self
    }

    pub fn build(self) -> DemoRepo {
        let temp = TempDir::new().unwrap();
        let workdir = temp.path().to_path_buf();
        let repo_path = workdir.join(&self.name);
        if self.cloned {
            fs::create_dir_all(&repo_path).unwrap();
            for (name, content) in &self.files {
                fs::write(repo_path.join(name), content).unwrap();
            }
        }
        DemoRepo {
            _temp: temp,
            workdir,
            repo_path,
        }
    }
}

impl Default for DemoRepoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry settings that keep GPU detection tests fast
pub fn fast_retry(max_retries: u32) -> RetryOptions {
    RetryOptions {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        jitter: 0.0,
    }
}

pub fn options_for(workdir: &Path) -> HandlerOptions {
    HandlerOptions {
        workdir: workdir.to_path_buf(),
        gpu_retry: fast_retry(2),
        ..Default::default()
    }
}

/// Handler for [`DEMO_URL`] backed by `runner`
pub fn handler(workdir: &Path, runner: Arc<MockRunner>) -> RepoHandler {
    RepoHandler::new(DEMO_URL, options_for(workdir), runner).unwrap()
}
