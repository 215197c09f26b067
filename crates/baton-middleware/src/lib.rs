//! # Baton Middleware
//!
//! The per-request [`Context`], its [`ContextPool`], the [`Middleware`] trait
//! and the [`Chain`] that runs middleware in order.
//!
//! ## Request cycle
//!
//! ```text
//! acquire → chain (stops on error or ctx.end()) → after-hooks | error → commit → release
//! ```
//!
//! - A middleware returning `Err` stops the chain; queued after-hooks are discarded.
//! - A middleware calling [`Context::end`] stops the chain without an error.
//! - The response is committed exactly once; later commits are no-ops.
//!
//! ## Example
//!
//! ```
//! use baton_middleware::{from_sync_fn, AppSettings, BoxedMiddleware, Chain, Context, Request};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let chain = Chain::new(vec![Arc::new(from_sync_fn("pong", |ctx| {
//!     ctx.text(http::StatusCode::OK, "pong");
//!     Ok(())
//! })) as BoxedMiddleware]);
//!
//! let mut ctx = Context::with_request(Arc::new(AppSettings::default()), Request::default());
//! chain.run(&mut ctx).await.unwrap();
//! assert_eq!(ctx.res().body(), b"pong");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/baton-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod adapter;
pub mod chain;
pub mod context;
pub mod middleware;
pub mod pool;
pub mod response;
pub mod settings;
pub mod types;

// Re-export main types at crate root
pub use adapter::{wrap_handler, Handler, HandlerMiddleware};
pub use chain::{BoxedMiddleware, Chain};
pub use context::{Context, Hook};
pub use middleware::{from_fn, from_sync_fn, BoxFuture, FnMiddleware, Middleware, SyncFnMiddleware};
pub use pool::{ContextPool, PooledContext};
pub use response::ResponseWriter;
pub use settings::AppSettings;
pub use types::{response_channel, Request, Response, ResponseReceiver, ResponseSink};
