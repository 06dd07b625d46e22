//! Telemetry initialization.
//!
//! Log events are written to stderr so `--json` output on stdout stays
//! machine-readable.

use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level for demogrip's own events
    pub default_level: Level,
    /// Whether to include file and line numbers
    pub include_file_line: bool,
    /// Whether to include the target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
    /// Custom filter directive (overrides default_level if set)
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            include_file_line: false,
            include_target: false,
            ansi_colors: std::io::stderr().is_terminal(),
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Configuration for the CLI's `--verbose` / `--quiet` flags.
    ///
    /// Verbose shows debug events, including every external command
    /// (`demogrip::cmd`). Quiet only shows errors.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        let default_level = if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            Level::WARN
        };
        Self {
            default_level,
            include_target: verbose,
            ..Default::default()
        }
    }
}

/// Guard that keeps the telemetry subscriber active.
pub struct TelemetryGuard {
    #[allow(dead_code)]
    _private: (),
}

/// Initialize telemetry with the given configuration.
///
/// `RUST_LOG` directives are honoured on top of the configured level.
/// Returns a guard that must be kept alive for the duration of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = if let Some(ref directive) = config.filter_directive {
        EnvFilter::try_new(directive)?
    } else {
        EnvFilter::builder()
            .with_default_directive(Level::WARN.into())
            .from_env_lossy()
            .add_directive(format!("demogrip={}", config.default_level).parse()?)
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.default_level, Level::WARN);
        assert!(config.filter_directive.is_none());
    }

    #[test]
    fn test_config_verbose() {
        let config = TelemetryConfig::from_flags(true, false);
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_target);
    }

    #[test]
    fn test_config_quiet() {
        let config = TelemetryConfig::from_flags(false, true);
        assert_eq!(config.default_level, Level::ERROR);
        assert!(!config.include_target);
    }

    #[test]
    fn test_verbose_wins_over_quiet() {
        let config = TelemetryConfig::from_flags(true, true);
        assert_eq!(config.default_level, Level::DEBUG);
    }
}
