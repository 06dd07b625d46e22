//! Configuration file (`demogrip.yaml`)
//!
//! Every field is optional. CLI flags and `DEMOGRIP_*` environment
//! variables take precedence over values read here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::host::HostEnvironment;
use crate::util::RetryOptions;

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "demogrip.yaml";

/// Errors that can occur when loading the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Executables used for each external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub git: String,
    pub pip: String,
    pub python: String,
    pub streamlit: String,
    pub nvidia_smi: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            pip: "pip".to_string(),
            python: "python".to_string(),
            streamlit: "streamlit".to_string(),
            nvidia_smi: "nvidia-smi".to_string(),
        }
    }
}

impl ToolConfig {
    /// `(name, executable)` pairs, in pipeline order
    pub fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("git", self.git.as_str()),
            ("pip", self.pip.as_str()),
            ("python", self.python.as_str()),
            ("streamlit", self.streamlit.as_str()),
            ("nvidia-smi", self.nvidia_smi.as_str()),
        ]
    }
}

/// Contents of `demogrip.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostEnvironment>,
    /// Directory repositories are cloned into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    pub tools: ToolConfig,
    /// Retry policy for failed `nvidia-smi` queries during model detection
    pub gpu_detection: RetryOptions,
}

impl DemoConfig {
    /// Parse config YAML
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the config.
    ///
    /// An explicit path must exist. Without one, `demogrip.yaml` in `dir` is
    /// used when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => {
                let default = dir.join(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        tracing::debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.host, None);
        assert_eq!(config.tools.nvidia_smi, "nvidia-smi");
        assert_eq!(config.gpu_detection.max_retries, 3);
        assert_eq!(config.gpu_detection.initial_delay_ms, 5000);
    }

    #[test]
    fn test_parse_partial() {
        let yaml = r#"
host: colab
workdir: /content
tools:
  pip: pip3
gpu_detection:
  max_retries: 1
"#;
        let config = DemoConfig::parse(yaml).unwrap();
        assert_eq!(config.host, Some(HostEnvironment::Colab));
        assert_eq!(config.workdir, Some(PathBuf::from("/content")));
        assert_eq!(config.tools.pip, "pip3");
        assert_eq!(config.tools.git, "git");
        assert_eq!(config.gpu_detection.max_retries, 1);
        assert_eq!(config.gpu_detection.initial_delay_ms, 5000);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(DemoConfig::parse("").unwrap(), DemoConfig::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            DemoConfig::parse("host: [unclosed"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_default_absent() {
        let temp = TempDir::new().unwrap();
        let config = DemoConfig::load(None, temp.path()).unwrap();
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn test_load_default_present() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "host: colab\n").unwrap();
        let config = DemoConfig::load(None, temp.path()).unwrap();
        assert_eq!(config.host, Some(HostEnvironment::Colab));
    }

    #[test]
    fn test_load_explicit_missing() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(matches!(
            DemoConfig::load(Some(&missing), temp.path()),
            Err(ConfigError::NotFound(_))
        ));
    }
}
