//! Ordered middleware execution.

use crate::context::Context;
use crate::middleware::Middleware;
use baton_core::MiddlewareResult;
use std::fmt;
use std::sync::Arc;

/// A shared middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Runs middleware strictly in registration order.
///
/// Execution stops at the first error or as soon as a middleware returns with
/// the context ended. Either way the context is marked ended afterwards.
#[derive(Clone, Default)]
pub struct Chain {
    middleware: Vec<BoxedMiddleware>,
}

impl Chain {
    /// Creates a chain from an ordered list.
    #[must_use]
    pub fn new(middleware: Vec<BoxedMiddleware>) -> Self {
        Self { middleware }
    }

    /// Appends a middleware.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    /// Number of middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Middleware names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Walks the chain against `ctx` and returns the first error.
    pub async fn run(&self, ctx: &mut Context) -> MiddlewareResult {
        let mut outcome = Ok(());

        for middleware in &self.middleware {
            if let Err(err) = middleware.call(ctx).await {
                tracing::debug!(middleware = middleware.name(), error = %err, "middleware failed");
                outcome = Err(err);
                break;
            }
            if ctx.is_ended() {
                tracing::trace!(middleware = middleware.name(), "chain ended");
                break;
            }
        }

        ctx.end();
        outcome
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("middleware", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{from_sync_fn, BoxFuture};
    use crate::settings::AppSettings;
    use crate::types::Request;
    use baton_core::{Failure, HttpError};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct OrderTrackingMiddleware {
        name: &'static str,
        log: Log,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn call<'a>(&'a self, _ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name);
                Ok(())
            })
        }
    }

    fn tracker(name: &'static str, log: &Log) -> BoxedMiddleware {
        Arc::new(OrderTrackingMiddleware {
            name,
            log: Arc::clone(log),
        })
    }

    fn ctx() -> Context {
        Context::with_request(Arc::new(AppSettings::default()), Request::default())
    }

    #[tokio::test]
    async fn test_runs_in_registration_order() {
        let log: Log = Arc::default();
        let chain = Chain::new(vec![tracker("a", &log), tracker("b", &log), tracker("c", &log)]);
        let mut ctx = ctx();

        chain.run(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(ctx.is_ended());
    }

    #[tokio::test]
    async fn test_stops_at_first_error() {
        let log: Log = Arc::default();
        let chain = Chain::new(vec![
            tracker("a", &log),
            Arc::new(from_sync_fn("fail", |_| Err(HttpError::new(409, "conflict").into()))),
            tracker("c", &log),
        ]);
        let mut ctx = ctx();

        let err = chain.run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, Failure::Http(ref e) if e.status() == 409));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        assert!(ctx.is_ended());
    }

    #[tokio::test]
    async fn test_stops_when_ended() {
        let log: Log = Arc::default();
        let chain = Chain::new(vec![
            tracker("a", &log),
            Arc::new(from_sync_fn("stop", |ctx| {
                ctx.end();
                Ok(())
            })),
            tracker("c", &log),
        ]);
        let mut ctx = ctx();

        chain.run(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_names() {
        let log: Log = Arc::default();
        let mut chain = Chain::default();
        assert!(chain.is_empty());
        chain.push(tracker("first", &log));
        chain.push(tracker("second", &log));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.names(), vec!["first", "second"]);
    }
}
