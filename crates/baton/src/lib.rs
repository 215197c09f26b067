//! # Baton
//!
//! A small HTTP dispatcher built around one idea: every request walks an
//! ordered list of middleware over a pooled, per-request [`Context`], and gets
//! exactly one response no matter how that walk ends.
//!
//! - A middleware returning an error stops the chain; the error is translated
//!   into a status and body by the app's error handler.
//! - A middleware calling [`Context::end`] stops the chain without an error.
//! - A panic anywhere in the chain becomes a plain 500 and a report to the
//!   app's error sink; panic details never reach the client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use baton::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     baton::telemetry::init_logging(&LogConfig::development()).ok();
//!
//!     App::named("hello")
//!         .use_sync_fn("greet", |ctx| {
//!             ctx.text(StatusCode::OK, "hello");
//!             Ok(())
//!         })
//!         .listen(":8080")
//!         .await
//! }
//! ```
//!
//! ## Request cycle
//!
//! ```text
//! acquire ─▶ chain ─┬─ Ok ──▶ after-hooks ─┬─▶ commit ─▶ release
//!                   ├─ Err ─▶ on_error ────┤
//!                   └─ panic ▶ 500 + report┘
//! ```
//!
//! [`Context`]: middleware::Context
//! [`Context::end`]: middleware::Context::end

#![doc(html_root_url = "https://docs.rs/baton/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use baton_core as core;

// Re-export middleware types
pub use baton_middleware as middleware;

// Re-export server types
pub use baton_server as server;

// Re-export logging setup
pub use baton_telemetry as telemetry;

pub use baton_core::VERSION;

/// Prelude module for convenient imports.
///
/// ```
/// use baton::prelude::*;
///
/// let app = App::new().use_sync_fn("ok", |_ctx: &mut Context| Ok(()));
/// assert_eq!(app.middleware_len(), 1);
/// ```
pub mod prelude {
    pub use baton_core::{mime, ErrorLog, Failure, HttpError, HttpStatus, MiddlewareResult, ProtocolError};

    pub use baton_middleware::{
        from_fn, from_sync_fn, BoxFuture, Context, Handler, Middleware, Request, Response,
        ResponseWriter,
    };

    pub use baton_server::{App, ServerConfig, ServerError, ServerListener};

    pub use baton_telemetry::{LogConfig, TracingErrorLog};

    pub use http::StatusCode;
}
