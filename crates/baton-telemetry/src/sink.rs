//! Default error sink.

use baton_core::ErrorLog;
use std::error::Error;

/// Reports errors as `tracing` events at `ERROR` level.
///
/// The full source chain is included in the `error` field, joined with `: `.
#[derive(Debug, Clone)]
pub struct TracingErrorLog {
    app: String,
}

impl TracingErrorLog {
    /// Creates a sink that tags every event with the application name.
    #[must_use]
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// Application name attached to events.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }
}

impl Default for TracingErrorLog {
    fn default() -> Self {
        Self::new("baton")
    }
}

impl ErrorLog for TracingErrorLog {
    fn report(&self, error: &(dyn Error + 'static)) {
        tracing::error!(app = %self.app, error = %error_chain(error), "request error");
    }
}

/// Renders an error followed by each of its sources.
#[must_use]
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        current = cause.source();
    }
    rendered
}
