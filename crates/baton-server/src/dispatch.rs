//! Per-request dispatch: pool, chain, panic recovery and error translation.
//!
//! ```text
//! acquire ─▶ ┌ recovery frame ─────────────────────────────────────┐ ─▶ commit ─▶ release
//!            │ chain ─▶ Ok  ─▶ after-hooks                         │
//!            │       └▶ Err ─▶ discard hooks, text type, on_error  │
//!            │ panic ─▶ fixed 500 + PanicError to the sink         │
//!            └─────────────────────────────────────────────────────┘
//! ```

use crate::app::ErrorHandler;
use baton_core::{panic_message, Failure, HttpError, PanicError, RequestSnapshot};
use baton_middleware::{response_channel, AppSettings, Chain, Context, ContextPool, Request, Response};
use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::Full;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Runs requests through an application's middleware.
///
/// Cheap to clone; all clones share the same chain, pool and error handler.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    chain: Chain,
    pool: ContextPool,
    on_error: ErrorHandler,
}

impl Dispatcher {
    pub(crate) fn new(chain: Chain, settings: Arc<AppSettings>, on_error: ErrorHandler) -> Self {
        Self {
            inner: Arc::new(Inner {
                chain,
                pool: ContextPool::new(settings),
                on_error,
            }),
        }
    }

    /// The context pool, exposed for diagnostics.
    #[must_use]
    pub fn pool(&self) -> &ContextPool {
        &self.inner.pool
    }

    /// Settings shared by every request.
    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        self.inner.pool.app()
    }

    /// Middleware names in execution order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.inner.chain.names()
    }

    /// Handles one request and returns the committed response.
    ///
    /// Never panics: a panic in any middleware, hook or error handler becomes
    /// a plain 500 response and a [`PanicError`] report. A panicking error
    /// sink is contained too; the report then goes to `tracing` instead.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let (sink, mut receiver) = response_channel();

        {
            let mut ctx = self.inner.pool.acquire(request, sink);

            let outcome = AssertUnwindSafe(self.process(&mut ctx)).catch_unwind().await;
            if let Err(payload) = outcome {
                self.recover(&mut ctx, payload.as_ref());
            }

            tracing::debug!(
                http.method = %method,
                http.path = %path,
                http.status_code = ctx.res().effective_status().as_u16(),
                duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );
            ctx.commit();
        }

        receiver.try_recv().unwrap_or_else(|_| {
            tracing::error!(http.path = %path, "no response committed");
            fallback_response()
        })
    }

    async fn process(&self, ctx: &mut Context) {
        match self.inner.chain.run(ctx).await {
            Ok(()) => ctx.run_after_hooks(),
            Err(failure) => self.translate(ctx, failure),
        }
    }

    fn translate(&self, ctx: &mut Context, failure: Failure) {
        ctx.discard_after_hooks();
        ctx.set_type("text");

        let Some(err) = (self.inner.on_error)(ctx, failure) else {
            return;
        };

        let status = err.status_code();
        ctx.set_status(status);
        if status.is_server_error() {
            report_contained(ctx, &err);
        }
        ctx.res_mut().set_body(err.message());
    }

    fn recover(&self, ctx: &mut Context, payload: &(dyn Any + Send)) {
        let report = PanicError::new(panic_message(payload), RequestSnapshot::capture(ctx.req()));

        let internal = HttpError::internal();
        ctx.discard_after_hooks();
        ctx.res_mut().clear();
        ctx.set_type("text");
        ctx.set_status(internal.status_code());
        ctx.res_mut().set_body(internal.message());

        report_contained(ctx, &report);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.inner.chain)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}

/// Forwards `error` to the app's sink without letting a sink panic unwind
/// past the dispatcher.
fn report_contained(ctx: &Context, error: &(dyn std::error::Error + 'static)) {
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| ctx.report(error))) {
        tracing::error!(
            app = ctx.app().name(),
            error = %error,
            panic = %panic_message(payload.as_ref()),
            "error sink panicked"
        );
    }
}

fn fallback_response() -> Response {
    let internal = HttpError::internal();
    let mut response = Response::new(Full::new(Bytes::from(internal.message().to_owned())));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// The error handler installed when the application does not set one.
///
/// An error status already set on the response (400 or above) wins over the
/// status derived from the failure itself.
pub fn default_error_handler(ctx: &mut Context, failure: Failure) -> Option<HttpError> {
    let hint = ctx
        .res()
        .status()
        .map(|status| status.as_u16())
        .filter(|code| *code >= 400);
    Some(failure.into_http_error(hint))
}
