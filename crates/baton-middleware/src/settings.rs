//! Read-only application state visible to every request.

use baton_core::ErrorLog;
use baton_telemetry::TracingErrorLog;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Application name, error sink and key/value settings shared by all
/// contexts of one application.
///
/// Built once when the application starts serving and never mutated after.
#[derive(Clone)]
pub struct AppSettings {
    name: String,
    error_log: Arc<dyn ErrorLog>,
    values: HashMap<String, serde_json::Value>,
}

impl AppSettings {
    /// Creates settings with the given name and sink and no values.
    #[must_use]
    pub fn new(name: impl Into<String>, error_log: Arc<dyn ErrorLog>) -> Self {
        Self {
            name: name.into(),
            error_log,
            values: HashMap::new(),
        }
    }

    /// Adds a setting.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Replaces all settings.
    #[must_use]
    pub fn with_values(mut self, values: HashMap<String, serde_json::Value>) -> Self {
        self.values = values;
        self
    }

    /// Application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// The error sink.
    #[must_use]
    pub fn error_log(&self) -> &Arc<dyn ErrorLog> {
        &self.error_log
    }

    /// Sends an error to the sink.
    pub fn report(&self, error: &(dyn std::error::Error + 'static)) {
        self.error_log.report(error);
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::new("baton", Arc::new(TracingErrorLog::default()))
    }
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("name", &self.name)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
