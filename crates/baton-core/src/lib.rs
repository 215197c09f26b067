//! # Baton Core
//!
//! Shared types for the Baton middleware dispatcher:
//!
//! - [`HttpError`] - Structured error with status, message and metadata
//! - [`Failure`] - Every error shape a middleware can return, plus normalization
//! - [`ErrorLog`] - Sink for server-side error reports
//! - [`RequestSnapshot`] / [`PanicError`] - Panic diagnostics
//! - [`mime`] - MIME constants and content-type shorthands

#![doc(html_root_url = "https://docs.rs/baton-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod mime;
mod report;

pub use error::{Failure, HttpError, HttpStatus, MiddlewareResult, ProtocolError, SharedError};
pub use report::{panic_message, ErrorLog, PanicError, RequestSnapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
