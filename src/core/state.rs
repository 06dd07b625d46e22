//! Record of the last launched demo
//!
//! Stored as JSON in `<repo>/.demogrip/launch.json` so a later invocation
//! can stop the server it started.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::manifest::Sdk;
use crate::process::CommandSpec;

/// Errors that can occur with the launch state file
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read launch state: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse launch state: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A demo server started by demogrip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchState {
    /// Process id of the server, when the runner reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub sdk: String,
    pub app_file: String,
    pub port: u16,
    pub command: CommandSpec,
    pub started_at: DateTime<Utc>,
}

impl LaunchState {
    pub fn new(pid: Option<u32>, sdk: &Sdk, app_file: &str, port: u16, command: CommandSpec) -> Self {
        Self {
            pid,
            sdk: sdk.to_string(),
            app_file: app_file.to_string(),
            port,
            command,
            started_at: Utc::now(),
        }
    }

    /// Location of the state file for a repository checkout
    pub fn path_for(repo_path: &Path) -> PathBuf {
        repo_path.join(".demogrip").join("launch.json")
    }

    /// Load the state, `None` when no demo has been recorded
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn remove(path: &Path) -> Result<(), StateError> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
