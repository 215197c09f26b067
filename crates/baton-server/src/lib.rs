//! # Baton Server
//!
//! The [`App`] that owns the middleware list, the [`Dispatcher`] that runs a
//! request through it with panic recovery and error translation, and the
//! listeners that feed it:
//!
//! - [`App::listen`] - blocking HTTP
//! - [`App::listen_tls`] - blocking HTTPS (rustls)
//! - [`App::start`] - background server returning a [`ServerListener`]
//!
//! ## Example
//!
//! ```rust
//! use baton_server::App;
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let server = App::new()
//!     .use_sync_fn("ping", |ctx| {
//!         ctx.text(StatusCode::OK, "pong");
//!         Ok(())
//!     })
//!     .start(None)
//!     .await
//!     .unwrap();
//!
//! assert!(server.local_addr().port() > 0);
//! server.close();
//! server.wait().await.unwrap();
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/baton-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod config;
mod dispatch;
mod error;
mod server;
mod shutdown;
pub mod tls;

pub use app::{App, ErrorHandler};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatch::{default_error_handler, Dispatcher};
pub use error::ServerError;
pub use server::ServerListener;
pub use shutdown::StopSignal;
