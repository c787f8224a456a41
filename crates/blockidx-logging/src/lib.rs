//! Logging setup for blockidx hosts and tests
//!
//! The indexer crates only emit `tracing` events. This crate installs a
//! subscriber for them.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines format for log aggregation (default)
//! - **Pretty Output**: Human-readable console output for development
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//! - **RUST_LOG**: Overrides the configured level when set
//!
//! # Quick Start
//!
//! ```ignore
//! use blockidx_logging::{LogConfig, SubscriberBuilder};
//!
//! // JSONL to console
//! let _guard = SubscriberBuilder::new().try_init()?;
//!
//! // Development mode with pretty human-readable output
//! let _guard = SubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .try_init()?;
//! ```
//!
//! Keep the returned guard alive while logging to a file; dropping it
//! flushes buffered lines.

pub mod config;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filter directive: {0}")]
    Filter(String),

    #[error("Failed to create log file appender: {0}")]
    Appender(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Builder for configuring and initializing the logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct SubscriberBuilder {
    config: LogConfig,
}

impl SubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// Returns the file writer guard when file output is configured. Fails
    /// if a global subscriber has already been set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            let level = self.config.console.level.as_deref();
            let filter = self.filter(level)?;
            let layer = if self.config.console.pretty {
                fmt::layer()
                    .with_ansi(self.config.console.ansi)
                    .with_target(true)
                    .with_filter(filter)
                    .boxed()
            } else {
                self.jsonl_layer(std::io::stdout, filter)
            };
            layers.push(layer);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(self.jsonl_layer(writer, self.filter(None)?));
        }

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
        Ok(guard)
    }

    /// RUST_LOG if set, otherwise `level` or the default level
    fn filter(&self, level: Option<&str>) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let level = level.unwrap_or(&self.config.default_level);
        EnvFilter::try_new(level).map_err(|e| LoggingError::Filter(e.to_string()))
    }

    fn jsonl_layer<W>(&self, writer: W, filter: EnvFilter) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let jsonl = &self.config.jsonl;
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(jsonl.include_spans)
            .flatten_event(jsonl.flatten_events)
            .with_file(jsonl.include_location)
            .with_line_number(jsonl.include_location)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking writer for the configured file; truncates for `Never`
/// rotation and appends otherwise
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            fs::create_dir_all(&config.directory)?;
            let path = config.directory.join(format!("{}.log", config.prefix));
            let file = File::create(path)?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.clone())
        .filename_suffix("log")
        .build(&config.directory)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() -> Result<(), LoggingError> {
    SubscriberBuilder::new()
        .with_config(LogConfig::development())
        .try_init()
        .map(|_| ())
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_testing() {
    let _ = SubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = SubscriberBuilder::new();
        assert_eq!(builder.config().default_level, "info");
    }

    #[test]
    fn test_default_is_jsonl() {
        let builder = SubscriberBuilder::new();
        assert!(!builder.config().console.pretty); // JSONL by default
    }

    #[test]
    fn test_builder_with_config() {
        let builder = SubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config().default_level, "debug");
        assert!(builder.config().console.pretty);
    }

    #[test]
    fn test_builder_with_level() {
        let builder = SubscriberBuilder::new().with_level("trace");
        assert_eq!(builder.config().default_level, "trace");
    }

    #[test]
    fn test_builder_with_console() {
        let builder = SubscriberBuilder::new().with_console(false);
        assert!(!builder.config().console.enabled);
    }

    #[test]
    fn test_invalid_level_rejected() {
        // Only meaningful when RUST_LOG is unset
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let builder = SubscriberBuilder::new().with_level("blockidx=loud");
        assert!(matches!(builder.filter(None), Err(LoggingError::Filter(_))));
    }

    #[test]
    fn test_init_testing_is_idempotent() {
        init_testing();
        init_testing();
    }
}
