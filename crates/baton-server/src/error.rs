//! Server error types.

use thiserror::Error;

/// Errors raised while setting up or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The application has no middleware to dispatch to.
    #[error("no middleware registered")]
    NoMiddleware,

    /// The listener could not be bound.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key material could not be loaded.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// I/O error on an established listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background serve task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
