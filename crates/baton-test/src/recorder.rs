//! An [`ErrorLog`] that keeps reports in memory for assertions.

use baton_core::ErrorLog;
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;

/// Collects every reported error as its display string.
///
/// Clones share the same buffer, so one handle can be given to the app
/// and another kept by the test.
#[derive(Clone, Default)]
pub struct RecordingErrorLog {
    reports: Arc<Mutex<Vec<String>>>,
}

impl RecordingErrorLog {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reports received so far.
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    /// Number of reports received.
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Forgets all reports.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl ErrorLog for RecordingErrorLog {
    fn report(&self, error: &(dyn Error + 'static)) {
        self.reports.lock().push(error.to_string());
    }
}

impl std::fmt::Debug for RecordingErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingErrorLog")
            .field("reports", &self.len())
            .finish()
    }
}
