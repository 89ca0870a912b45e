//! Logging setup.
//!
//! Logging is configured from an explicit [`LogConfig`] built from the
//! command line and installed once at startup. Logs go to stderr so they
//! never mix with tables on stdout.

use std::io::{self, IsTerminal};

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Plain,
    /// ANSI colored levels.
    Colored,
}

impl LogStyle {
    /// Colored when stderr is a terminal and color was not disabled.
    pub fn detect(no_color: bool) -> Self {
        if !no_color && io::stderr().is_terminal() {
            LogStyle::Colored
        } else {
            LogStyle::Plain
        }
    }
}

/// Log level and style for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Number of `-v` flags.
    pub verbosity: u8,
    pub style: LogStyle,
}

impl LogConfig {
    pub fn new(verbosity: u8, style: LogStyle) -> Self {
        Self { verbosity, style }
    }

    /// Filter directive for the verbosity: error, info (`-v`), debug (`-vv`).
    pub fn directive(&self) -> &'static str {
        match self.verbosity {
            0 => "error",
            1 => "info",
            _ => "debug",
        }
    }

    /// The filter to install. `RUST_LOG` applies when no `-v` was given.
    pub fn filter(&self) -> EnvFilter {
        if self.verbosity == 0 {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
        } else {
            EnvFilter::new(self.directive())
        }
    }

    /// Install the global subscriber. Fails if one is already installed.
    pub fn install(&self) -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(io::stderr)
            .with_ansi(self.style == LogStyle::Colored)
            .with_target(self.verbosity > 1)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
    }
}
