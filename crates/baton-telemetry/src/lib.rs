//! Logging for Baton.
//!
//! - [`init_logging`] / [`LogConfig`] - Install a `tracing-subscriber` stack
//! - [`TracingErrorLog`] - Default [`baton_core::ErrorLog`] that emits `tracing` events

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod sink;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use sink::{error_chain, TracingErrorLog};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
