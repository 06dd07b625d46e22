//! Hosting environment the demo runs in

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where demogrip is running. Only affects the banner printed on startup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HostEnvironment {
    /// Google Colab
    Colab,
    /// SageMaker Studio Lab or a local machine
    #[default]
    Other,
}

impl HostEnvironment {
    pub fn banner(&self) -> &'static str {
        match self {
            HostEnvironment::Colab => "Running on Google Colab",
            HostEnvironment::Other => "Running on SageMaker Studio Lab or locally",
        }
    }
}

impl fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEnvironment::Colab => write!(f, "colab"),
            HostEnvironment::Other => write!(f, "other"),
        }
    }
}
