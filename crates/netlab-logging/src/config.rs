//! What the subscriber should emit, and where

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix of rolling log file names
pub const LOG_FILE_PREFIX: &str = "netlab";

/// Rendering of console events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// Human-readable, one event per line with target
    #[default]
    Pretty,
    /// One JSON object per event, span fields flattened
    Json,
    /// No console output
    Off,
}

/// Subscriber settings for a netlab process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub console: ConsoleFormat,
    /// Colour pretty output
    pub ansi: bool,
    /// Mirror events as JSON lines into daily files here
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleFormat::Pretty,
            ansi: true,
            log_dir: None,
        }
    }
}

impl LogConfig {
    /// Settings behind the `netlab` flags `--verbose`, `--json-logs` and
    /// `--log-dir`
    pub fn from_flags(verbose: bool, json_logs: bool, log_dir: Option<PathBuf>) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            console: if json_logs {
                ConsoleFormat::Json
            } else {
                ConsoleFormat::Pretty
            },
            ansi: !json_logs,
            log_dir,
        }
    }

    /// Warnings only, plain text
    pub fn quiet() -> Self {
        Self {
            level: "warn".to_string(),
            ansi: false,
            ..Self::default()
        }
    }
}
