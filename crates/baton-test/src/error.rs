//! Errors raised by the test harness itself.

use baton_server::ServerError;

/// Failures while building requests or inspecting responses in tests.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The request could not be assembled.
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// The response body could not be read or decoded.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The application could not be turned into a dispatcher.
    #[error("application setup failed: {0}")]
    Setup(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TestError::RequestBuild("bad uri".to_string());
        assert_eq!(err.to_string(), "failed to build request: bad uri");

        let err = TestError::from(ServerError::NoMiddleware);
        assert!(err.to_string().starts_with("application setup failed"));
    }
}
