//! Logging setup for netlab
//!
//! All netlab crates log through `tracing`. This crate installs the global
//! subscriber: an `EnvFilter` (honouring `RUST_LOG`), a pretty or JSON-lines
//! console layer, and an optional JSON-lines file layer.
//!
//! ```ignore
//! use netlab_logging::{LogConfig, NetlabSubscriberBuilder};
//!
//! let _guard = NetlabSubscriberBuilder::new()
//!     .with_config(LogConfig::from_flags(true, false, None))
//!     .init()?;
//! ```

pub mod config;

pub use config::{ConsoleFormat, LOG_FILE_PREFIX, LogConfig};

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to open log file: {0}")]
    File(String),

    #[error("A global subscriber is already installed")]
    AlreadyInitialized,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builder for configuring and installing the netlab subscriber
#[derive(Debug, Default)]
pub struct NetlabSubscriberBuilder {
    config: LogConfig,
}

impl NetlabSubscriberBuilder {
    /// Pretty console at `info`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the filter used when `RUST_LOG` is unset
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally.
    ///
    /// The returned guard flushes the file writer on drop and must be kept
    /// alive while logging to a file.
    pub fn init(self) -> Result<Option<WorkerGuard>, LogError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.config.level)
                .map_err(|e| LogError::InvalidFilter(e.to_string()))?,
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(layer) = console_layer(&self.config) {
            layers.push(layer);
        }

        if let Some(dir) = &self.config.log_dir {
            let (writer, file_guard) = tracing_appender::non_blocking(daily_appender(dir)?);
            guard = Some(file_guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_writer(writer)
                    .boxed(),
            );
        }

        Registry::default()
            .with(layers)
            .with(env_filter)
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized)?;

        Ok(guard)
    }
}

fn console_layer(config: &LogConfig) -> Option<BoxedLayer> {
    match config.console {
        ConsoleFormat::Pretty => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(config.ansi)
                .with_target(true)
                .boxed(),
        ),
        ConsoleFormat::Json => Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .flatten_event(true)
                .boxed(),
        ),
        ConsoleFormat::Off => None,
    }
}

fn daily_appender(dir: &Path) -> Result<RollingFileAppender, LogError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| LogError::File(e.to_string()))
}
