//! Core middleware trait and function adapters.
//!
//! A middleware receives the request [`Context`] and returns
//! [`MiddlewareResult`]. Returning an error stops the chain and sends the error
//! to the application's error handler; calling [`Context::end`] stops the
//! chain without an error.
//!
//! # Example
//!
//! ```
//! use baton_middleware::{BoxFuture, Context, Middleware};
//! use baton_core::MiddlewareResult;
//!
//! struct Pong;
//!
//! impl Middleware for Pong {
//!     fn name(&self) -> &'static str {
//!         "pong"
//!     }
//!
//!     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
//!         Box::pin(async move {
//!             ctx.text(http::StatusCode::OK, "pong");
//!             ctx.end();
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::context::Context;
use baton_core::MiddlewareResult;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One step of the request chain.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult>;
}

/// A middleware backed by an async closure.
///
/// The closure must return a boxed future borrowing the context, which is
/// what [`Box::pin`] around an `async move` block produces.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
        (self.func)(ctx)
    }
}

/// A middleware backed by a synchronous closure.
pub struct SyncFnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> SyncFnMiddleware<F> {
    /// Creates a new synchronous middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for SyncFnMiddleware<F>
where
    F: Fn(&mut Context) -> MiddlewareResult + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(std::future::ready((self.func)(ctx)))
    }
}

/// Builds a middleware from an async closure.
///
/// ```
/// use baton_middleware::from_fn;
///
/// let hello = from_fn("hello", |ctx| {
///     Box::pin(async move {
///         ctx.text(http::StatusCode::OK, "hello");
///         Ok(())
///     })
/// });
/// # let _ = hello;
/// ```
pub fn from_fn<F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
{
    FnMiddleware::new(name, func)
}

/// Builds a middleware from a synchronous closure.
pub fn from_sync_fn<F>(name: &'static str, func: F) -> SyncFnMiddleware<F>
where
    F: Fn(&mut Context) -> MiddlewareResult + Send + Sync + 'static,
{
    SyncFnMiddleware::new(name, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AppSettings;
    use crate::types::Request;
    use baton_core::{Failure, HttpError};
    use http::StatusCode;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::with_request(Arc::new(AppSettings::default()), Request::default())
    }

    struct Greeting(&'static str);

    impl Middleware for Greeting {
        fn name(&self) -> &'static str {
            "greeting"
        }

        fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
            Box::pin(async move {
                ctx.text(StatusCode::OK, self.0);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_trait_middleware() {
        let mut ctx = ctx();
        let m = Greeting("hi");
        assert_eq!(m.name(), "greeting");
        m.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.res().body(), b"hi");
    }

    #[tokio::test]
    async fn test_fn_middleware() {
        let m = from_fn("teapot", |ctx| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                ctx.set_status(StatusCode::IM_A_TEAPOT);
                Ok(())
            })
        });
        let mut ctx = ctx();

        m.call(&mut ctx).await.unwrap();

        assert_eq!(m.name(), "teapot");
        assert_eq!(ctx.res().status(), Some(StatusCode::IM_A_TEAPOT));
    }

    #[tokio::test]
    async fn test_sync_fn_middleware_error() {
        let m = from_sync_fn("deny", |_ctx| Err(HttpError::new(403, "forbidden").into()));
        let mut ctx = ctx();

        let err = m.call(&mut ctx).await.unwrap_err();
        assert!(matches!(err, Failure::Http(ref e) if e.status() == 403));
    }
}
