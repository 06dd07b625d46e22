//! Context passed to command handlers
//!
//! Bundles the resolved configuration, global CLI flags, and the process
//! runner into a single struct.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::Output;
use crate::core::config::DemoConfig;
use crate::core::handler::{HandlerOptions, RepoHandler};
use crate::core::host::HostEnvironment;
use crate::process::{CommandRunner, SystemRunner};

/// Context available to all command handlers.
///
/// Created once in `main()` after resolving config, env and flags.
pub struct DemoContext {
    /// Resolved handler settings
    pub options: HandlerOptions,
    /// Runner for every external command
    pub runner: Arc<dyn CommandRunner>,
    /// Suppress non-essential output (`--quiet`)
    pub quiet: bool,
}

impl DemoContext {
    pub fn new(options: HandlerOptions, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            options,
            runner,
            quiet: false,
        }
    }

    /// Resolve settings: flags win over the config file, which wins over defaults
    pub fn resolve(
        config: &DemoConfig,
        host: Option<HostEnvironment>,
        workdir: Option<PathBuf>,
        quiet: bool,
    ) -> Self {
        let mut options = HandlerOptions::from_config(config);
        if let Some(host) = host {
            options.host = host;
        }
        if let Some(workdir) = workdir {
            options.workdir = workdir;
        }
        Self {
            options,
            runner: Arc::new(SystemRunner),
            quiet,
        }
    }

    /// Create a handler for `url`, announcing the host environment
    pub fn open(&self, url: &str) -> anyhow::Result<RepoHandler> {
        let handler = RepoHandler::new(url, self.options.clone(), Arc::clone(&self.runner))?;
        if !self.quiet {
            Output::header(handler.host().banner());
        }
        Ok(handler)
    }

    /// Create a handler without printing anything (for JSON output)
    pub fn open_silent(&self, url: &str) -> anyhow::Result<RepoHandler> {
        Ok(RepoHandler::new(
            url,
            self.options.clone(),
            Arc::clone(&self.runner),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_flags_override_config() {
        let config = DemoConfig {
            host: Some(HostEnvironment::Other),
            workdir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let ctx = DemoContext::resolve(
            &config,
            Some(HostEnvironment::Colab),
            Some(PathBuf::from("/from/flag")),
            true,
        );
        assert_eq!(ctx.options.host, HostEnvironment::Colab);
        assert_eq!(ctx.options.workdir, PathBuf::from("/from/flag"));
        assert!(ctx.quiet);
    }

    #[test]
    fn test_resolve_falls_back_to_config() {
        let config = DemoConfig {
            workdir: Some(PathBuf::from("/content")),
            ..Default::default()
        };
        let ctx = DemoContext::resolve(&config, None, None, false);
        assert_eq!(ctx.options.host, HostEnvironment::Other);
        assert_eq!(ctx.options.workdir, PathBuf::from("/content"));
    }
}
