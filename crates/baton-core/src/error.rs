//! Error types for Baton.
//!
//! This module provides [`HttpError`], the structured error that every failure
//! is eventually translated into, and [`Failure`], the closed set of error
//! shapes a middleware may return.
//!
//! # Normalization order
//!
//! [`Failure::into_http_error`] classifies a failure by its shape. The first
//! matching variant wins:
//!
//! | Variant | Resulting status | Resulting message |
//! |---|---|---|
//! | `Http` | unchanged | unchanged |
//! | `Protocol` | protocol code | protocol message |
//! | `Status` | `HttpStatus::status()` | `Display` of the error |
//! | `Other` | 500, or the caller's fallback | `Display` of the error |

use http::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Result type returned by every middleware.
pub type MiddlewareResult = Result<(), Failure>;

/// Shared, type-erased error kept as the cause of a normalized [`HttpError`].
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Structured error carrying a status code, message and optional metadata.
///
/// An `HttpError` is both the signal that a request failed and the response the
/// client receives: the finalizer writes [`HttpError::status`] as the response
/// status and [`HttpError::message`] as the body.
///
/// # Example
///
/// ```
/// use baton_core::HttpError;
///
/// let err = HttpError::new(404, "not found");
/// assert_eq!(err.status(), 404);
/// assert_eq!(err.to_string(), "not found");
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
    code: u16,
    message: String,
    meta: Option<serde_json::Value>,
    source: Option<SharedError>,
}

impl HttpError {
    /// Creates an error with the given status code and message.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            meta: None,
            source: None,
        }
    }

    /// Creates an error whose message is the canonical reason phrase of `status`.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
        )
    }

    /// The generic server error used when nothing more specific is known.
    #[must_use]
    pub fn internal() -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attaches opaque metadata to the error.
    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Records the error this one was derived from.
    #[must_use]
    pub fn with_source(mut self, source: SharedError) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.code
    }

    /// Returns the status as an [`http::StatusCode`].
    ///
    /// Codes outside the valid HTTP range map to 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the metadata payload, if any.
    #[must_use]
    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }

    /// Returns true for 5xx codes.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.code >= 500
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<StatusCode> for HttpError {
    fn from(status: StatusCode) -> Self {
        Self::from_status(status)
    }
}

/// An error reported by a line-oriented text protocol: a numeric reply code
/// plus the reply text.
///
/// Displays as `"{code:03} {message}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// Numeric reply code.
    pub code: u16,
    /// Reply text.
    pub message: String,
}

impl ProtocolError {
    /// Creates a protocol error.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03} {}", self.code, self.message)
    }
}

impl std::error::Error for ProtocolError {}

/// Capability implemented by errors that know their own HTTP status.
///
/// # Example
///
/// ```
/// use baton_core::{Failure, HttpStatus};
///
/// #[derive(Debug)]
/// struct Locked;
///
/// impl std::fmt::Display for Locked {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("resource is locked")
///     }
/// }
///
/// impl std::error::Error for Locked {}
///
/// impl HttpStatus for Locked {
///     fn status(&self) -> u16 {
///         423
///     }
/// }
///
/// let err = Failure::status(Locked).into_http_error(None);
/// assert_eq!(err.status(), 423);
/// assert_eq!(err.message(), "resource is locked");
/// ```
pub trait HttpStatus: std::error::Error + Send + Sync + 'static {
    /// The HTTP status this error should produce.
    fn status(&self) -> u16;
}

/// Every shape of failure a middleware can return.
#[derive(Debug)]
pub enum Failure {
    /// Already structured; passes through normalization unchanged.
    Http(HttpError),
    /// Text-protocol error mapped by its code and message.
    Protocol(ProtocolError),
    /// Any error exposing its own status.
    Status(Box<dyn HttpStatus>),
    /// Anything else. Normalizes to 500 unless a fallback code is supplied.
    Other(anyhow::Error),
}

impl Failure {
    /// Wraps an error that carries its own status.
    pub fn status(err: impl HttpStatus) -> Self {
        Self::Status(Box::new(err))
    }

    /// Creates an unstructured failure from a message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Other(anyhow::Error::msg(message))
    }

    /// Normalizes this failure into an [`HttpError`].
    ///
    /// `fallback` replaces the default 500 for the `Other` shape only, and only
    /// when it is non-zero. Structured shapes always keep their own code.
    #[must_use]
    pub fn into_http_error(self, fallback: Option<u16>) -> HttpError {
        match self {
            Self::Http(err) => err,
            Self::Protocol(err) => {
                let normalized = HttpError::new(err.code, err.message.clone());
                normalized.with_source(Arc::new(err))
            }
            Self::Status(err) => {
                let normalized = HttpError::new(err.status(), err.to_string());
                normalized.with_source(Arc::new(StatusSource(err)))
            }
            Self::Other(err) => {
                let code = fallback.filter(|code| *code > 0).unwrap_or(500);
                let normalized = HttpError::new(code, err.to_string());
                let source: Box<dyn std::error::Error + Send + Sync> = err.into();
                normalized.with_source(Arc::from(source))
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => fmt::Display::fmt(err, f),
            Self::Protocol(err) => fmt::Display::fmt(err, f),
            Self::Status(err) => fmt::Display::fmt(err, f),
            Self::Other(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Protocol(err) => Some(err),
            Self::Status(err) => err.source(),
            Self::Other(err) => Some(&**err),
        }
    }
}

/// Keeps a status-bearing error alive as the cause of a normalized error.
#[derive(Debug)]
struct StatusSource(Box<dyn HttpStatus>);

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for StatusSource {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<HttpError> for Failure {
    fn from(err: HttpError) -> Self {
        Self::Http(err)
    }
}

impl From<ProtocolError> for Failure {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<http::Error> for Failure {
    fn from(err: http::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<StatusCode> for Failure {
    fn from(status: StatusCode) -> Self {
        Self::Http(HttpError::from_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Teapot;

    impl fmt::Display for Teapot {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("short and stout")
        }
    }

    impl std::error::Error for Teapot {}

    impl HttpStatus for Teapot {
        fn status(&self) -> u16 {
            418
        }
    }

    #[test]
    fn test_structured_error_passes_through() {
        let err = HttpError::new(404, "not found").with_meta(serde_json::json!({"id": 7}));
        let normalized = Failure::from(err).into_http_error(Some(503));

        assert_eq!(normalized.status(), 404);
        assert_eq!(normalized.message(), "not found");
        assert_eq!(normalized.meta().unwrap()["id"], 7);
    }

    #[test]
    fn test_protocol_error_maps_code_and_message() {
        let normalized = Failure::from(ProtocolError::new(550, "mailbox unavailable"))
            .into_http_error(None);

        assert_eq!(normalized.status(), 550);
        assert_eq!(normalized.message(), "mailbox unavailable");
        assert_eq!(
            normalized.source().unwrap().to_string(),
            "550 mailbox unavailable"
        );
    }

    #[test]
    fn test_status_capability_maps_directly() {
        let normalized = Failure::status(Teapot).into_http_error(Some(400));
        assert_eq!(normalized.status(), 418);
        assert_eq!(normalized.message(), "short and stout");
    }

    #[test]
    fn test_generic_error_defaults_to_500() {
        let normalized = Failure::msg("boom").into_http_error(None);
        assert_eq!(normalized.status(), 500);
        assert_eq!(normalized.message(), "boom");
        assert!(normalized.source().is_some());
    }

    #[test]
    fn test_generic_error_uses_fallback() {
        let normalized = Failure::msg("bad input").into_http_error(Some(422));
        assert_eq!(normalized.status(), 422);
    }

    #[test]
    fn test_zero_fallback_is_ignored() {
        let normalized = Failure::msg("boom").into_http_error(Some(0));
        assert_eq!(normalized.status(), 500);
    }

    #[test]
    fn test_io_error_is_generic() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let failure = Failure::from(io);
        assert!(matches!(failure, Failure::Other(_)));
        assert_eq!(failure.into_http_error(None).message(), "disk full");
    }

    #[test]
    fn test_status_code_conversion() {
        let failure = Failure::from(StatusCode::FORBIDDEN);
        let normalized = failure.into_http_error(None);
        assert_eq!(normalized.status(), 403);
        assert_eq!(normalized.message(), "Forbidden");
    }

    #[test]
    fn test_invalid_code_maps_to_internal_status() {
        let err = HttpError::new(42, "odd");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.status(), 42);
    }

    #[test]
    fn test_internal_error() {
        let err = HttpError::internal();
        assert_eq!(err.status(), 500);
        assert_eq!(err.message(), "Internal Server Error");
        assert!(err.is_server_error());
    }
}
