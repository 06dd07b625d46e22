//! Demo manifest parsing
//!
//! A demo repository describes itself in the front matter of its
//! `README.md` (`title: ...`, `sdk: gradio`, `app_file: app.py`, ...).
//! The parser is deliberately loose: any line of the form `key: value`
//! becomes an entry, so the YAML front matter is read without a YAML
//! parser and body text that happens to contain a colon is tolerated.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the manifest file at the repository root
pub const MANIFEST_FILE: &str = "README.md";

/// Lines containing this marker are skipped (the "Check out the configuration
/// reference" footer generated by Hugging Face Spaces).
const SKIP_MARKER: &str = "Check";

/// Errors that can occur when loading or reading a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No manifest file at {0}")]
    Missing(PathBuf),

    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Manifest is missing required field '{0}'")]
    MissingField(String),
}

/// Demo framework declared by the manifest's `sdk` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sdk {
    Gradio,
    Streamlit,
    /// Anything else, typically `static`
    Other(String),
}

impl From<&str> for Sdk {
    fn from(value: &str) -> Self {
        match value {
            "gradio" => Sdk::Gradio,
            "streamlit" => Sdk::Streamlit,
            other => Sdk::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sdk::Gradio => write!(f, "gradio"),
            Sdk::Streamlit => write!(f, "streamlit"),
            Sdk::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Key/value pairs read from a demo manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DemoManifest {
    entries: BTreeMap<String, String>,
}

impl DemoManifest {
    /// Parse manifest text.
    ///
    /// A line becomes an entry when it has a colon after its first byte and
    /// does not contain `Check`. The key is everything before the first
    /// colon, verbatim; the value is the rest, trimmed. Later duplicates win.
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .filter(|line| !line.contains(SKIP_MARKER))
            .filter_map(|line| match line.find(':') {
                Some(pos) if pos > 0 => {
                    let (key, value) = line.split_at(pos);
                    Some((key.to_string(), value[1..].trim().to_string()))
                }
                _ => None,
            })
            .collect();
        Self { entries }
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a field that must be present
    pub fn require(&self, key: &str) -> Result<&str, ManifestError> {
        self.get(key)
            .ok_or_else(|| ManifestError::MissingField(key.to_string()))
    }

    pub fn title(&self) -> Result<&str, ManifestError> {
        self.require("title")
    }

    pub fn sdk(&self) -> Result<Sdk, ManifestError> {
        self.require("sdk").map(Sdk::from)
    }

    pub fn app_file(&self) -> Result<&str, ManifestError> {
        self.require("app_file")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
