//! Logging setup shared by the `cellar-*` binaries
//!
//! Everything is written to stderr; stdout carries command results only
//! (wine details, review JSON and so on).
//!
//! # Examples
//!
//! ```no_run
//! use libcellar::logging::{LogFormat, LogSettings};
//!
//! LogSettings::new(LogFormat::Json, "info").install();
//!
//! // Or honour CELLAR_LOG_FORMAT / CELLAR_LOG_LEVEL
//! libcellar::logging::init_from_env(false);
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::{CellarError, Result};

/// Environment variable selecting the log format
pub const FORMAT_ENV: &str = "CELLAR_LOG_FORMAT";

/// Environment variable holding the filter directive, e.g. `info` or
/// `libcellar=debug`
pub const LEVEL_ENV: &str = "CELLAR_LOG_LEVEL";

const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain single-line records without colour
    #[default]
    Text,
    /// One JSON object per record
    Json,
    /// Multi-line, coloured, with source locations
    Pretty,
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Text, LogFormat::Json, LogFormat::Pretty];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self> {
        LogFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CellarError::InvalidInput(format!(
                    "Unknown log format '{}'. Valid formats: text, json, pretty",
                    s
                ))
            })
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscriber settings resolved from flags and environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Filter directive applied when `RUST_LOG` is unset
    pub directive: String,
}

impl LogSettings {
    pub fn new(format: LogFormat, directive: impl Into<String>) -> Self {
        Self {
            format,
            directive: directive.into(),
        }
    }

    /// Read `CELLAR_LOG_FORMAT` and `CELLAR_LOG_LEVEL`
    ///
    /// An unparseable format falls back to text. `verbose` overrides the
    /// level with `debug`.
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var(FORMAT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();

        let directive = if verbose {
            "debug".to_string()
        } else {
            std::env::var(LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LEVEL.to_string())
        };

        Self { format, directive }
    }

    /// Only the pretty format emits colour escapes
    pub fn ansi(&self) -> bool {
        matches!(self.format, LogFormat::Pretty)
    }

    /// Install the global subscriber; later calls leave the first one in place
    pub fn install(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.directive));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(self.ansi());

        let installed = match self.format {
            LogFormat::Text => builder.with_target(false).try_init(),
            LogFormat::Json => builder.json().flatten_event(true).try_init(),
            LogFormat::Pretty => builder
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .try_init(),
        };

        if installed.is_err() {
            tracing::debug!("Subscriber already installed, keeping it");
        }
    }
}

/// Install logging for a binary from its `--verbose` flag and the environment
pub fn init_from_env(verbose: bool) {
    LogSettings::from_env(verbose).install();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);

        let err = "yaml".parse::<LogFormat>().unwrap_err();
        assert!(matches!(err, CellarError::InvalidInput(_)));
        assert!(err.to_string().contains("'yaml'"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var(FORMAT_ENV);
        std::env::remove_var(LEVEL_ENV);

        assert_eq!(
            LogSettings::from_env(false),
            LogSettings::new(LogFormat::Text, "warn")
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        std::env::set_var(FORMAT_ENV, "json");
        std::env::set_var(LEVEL_ENV, "libcellar=trace");

        let settings = LogSettings::from_env(false);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.directive, "libcellar=trace");

        // --verbose wins over the level variable
        assert_eq!(LogSettings::from_env(true).directive, "debug");

        std::env::set_var(FORMAT_ENV, "xml");
        assert_eq!(LogSettings::from_env(false).format, LogFormat::Text);

        std::env::remove_var(FORMAT_ENV);
        std::env::remove_var(LEVEL_ENV);
    }

    #[test]
    fn test_ansi_only_for_pretty() {
        assert!(!LogSettings::new(LogFormat::Text, "warn").ansi());
        assert!(!LogSettings::new(LogFormat::Json, "warn").ansi());
        assert!(LogSettings::new(LogFormat::Pretty, "warn").ansi());
    }

    #[test]
    fn test_install_twice_does_not_panic() {
        let settings = LogSettings::new(LogFormat::Text, "warn");
        settings.install();
        settings.install();
    }
}
