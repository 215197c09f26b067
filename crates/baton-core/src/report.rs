//! Error reporting.
//!
//! Server-side failures (5xx responses and recovered panics) are sent to an
//! [`ErrorLog`]. The default sink lives in `baton-telemetry` and forwards to
//! `tracing`; tests swap in a recording sink.

use std::any::Any;
use std::error::Error;
use std::fmt;

/// Destination for server-side error reports.
///
/// Closures taking `&(dyn Error + 'static)` implement this trait, so a custom
/// sink can be installed without a new type:
///
/// ```
/// use baton_core::ErrorLog;
/// use std::sync::Arc;
///
/// let sink: Arc<dyn ErrorLog> = Arc::new(|err: &(dyn std::error::Error + 'static)| {
///     eprintln!("server error: {err}");
/// });
/// # let _ = sink;
/// ```
pub trait ErrorLog: Send + Sync + 'static {
    /// Records one error.
    fn report(&self, error: &(dyn Error + 'static));
}

impl<F> ErrorLog for F
where
    F: Fn(&(dyn Error + 'static)) + Send + Sync + 'static,
{
    fn report(&self, error: &(dyn Error + 'static)) {
        self(error);
    }
}

/// A panic caught while a request was being processed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("panic recovered: {message}; {snapshot}")]
pub struct PanicError {
    message: String,
    snapshot: RequestSnapshot,
}

impl PanicError {
    /// Builds a report from the panic message and the request it interrupted.
    #[must_use]
    pub fn new(message: impl Into<String>, snapshot: RequestSnapshot) -> Self {
        Self {
            message: message.into(),
            snapshot,
        }
    }

    /// The panic payload rendered as text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The request that was in flight.
    #[must_use]
    pub fn snapshot(&self) -> &RequestSnapshot {
        &self.snapshot
    }
}

/// Extracts a readable message from a panic payload.
///
/// `panic!` payloads are either `&'static str` or `String`; anything else is
/// reported as `"unknown panic"`.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Single-line text dump of a request line and headers, used in panic reports.
///
/// The body is never included. Line breaks are escaped so the whole dump fits
/// on one log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSnapshot(String);

impl RequestSnapshot {
    /// Captures the request line and headers of `request`.
    #[must_use]
    pub fn capture<B>(request: &http::Request<B>) -> Self {
        let uri = request
            .uri()
            .path_and_query()
            .map_or("/", http::uri::PathAndQuery::as_str);

        let mut dump = format!("{} {} {:?}\r\n", request.method(), uri, request.version());

        if !request.headers().contains_key(http::header::HOST) {
            if let Some(authority) = request.uri().authority() {
                dump.push_str(&format!("Host: {authority}\r\n"));
            }
        }

        for (name, value) in request.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            dump.push_str(&format!("{name}: {value}\r\n"));
        }
        dump.push_str("\r\n");

        Self(dump.replace('\n', "\\n"))
    }

    /// Returns the escaped dump.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
