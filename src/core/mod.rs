//! Core business logic for demogrip

pub mod config;
pub mod handler;
pub mod host;
pub mod manifest;
pub mod state;

pub use config::DemoConfig;
pub use handler::{RepoHandler, DEMO_PORT};
pub use host::HostEnvironment;
pub use manifest::DemoManifest;
pub use state::LaunchState;
