//! Structured logging setup.
//!
//! Baton logs through `tracing`. Applications that do not install their own
//! subscriber can call [`init_logging`] once at startup.
//!
//! # Example
//!
//! ```no_run
//! use baton_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_level("baton_server=debug,hyper=warn"))?;
//! tracing::info!(addr = "127.0.0.1:3000", "server starting");
//! # Ok::<(), baton_telemetry::TelemetryError>(())
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "baton_server=debug,hyper=warn").
    pub level: String,

    /// Whether to output JSON lines.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,

    /// Whether to prefer `RUST_LOG` over `level` when it is set.
    pub env_override: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            env_override: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Compact output that only shows warnings and errors.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            include_target: false,
            ..Self::default()
        }
    }

    /// Replaces the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Builds the filter this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidFilter` if the directive does not parse.
    pub fn filter(&self) -> TelemetryResult<EnvFilter> {
        if self.env_override {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        create_env_filter(&self.level)
    }
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Returns `Ok(())` without doing anything when logging is disabled.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for a bad directive and
/// `TelemetryError::LoggingInit` if a global subscriber already exists.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive is malformed.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}
