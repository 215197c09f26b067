//! The per-request context.
//!
//! A [`Context`] carries the request, the [`ResponseWriter`], the ended flag
//! and the queued after-hooks through the middleware chain. Instances are
//! recycled by the [`ContextPool`](crate::pool::ContextPool); everything is
//! restored to defaults between requests.

use crate::response::ResponseWriter;
use crate::settings::AppSettings;
use crate::types::{Request, ResponseSink};
use baton_core::{mime, Failure};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deferred callback run after the chain completes without error.
pub type Hook = Box<dyn FnOnce(&mut Context) + Send>;

/// State threaded through the middleware chain for one request.
///
/// # Example
///
/// ```
/// use baton_middleware::{AppSettings, Context, Request};
/// use std::sync::Arc;
///
/// let mut ctx = Context::with_request(Arc::new(AppSettings::default()), Request::default());
/// ctx.text(http::StatusCode::OK, "pong");
/// ctx.end();
///
/// assert!(ctx.is_ended());
/// assert_eq!(ctx.res().body(), b"pong");
/// ```
pub struct Context {
    request: Request,
    response: ResponseWriter,
    ended: bool,
    hooks: Vec<Hook>,
    hooks_closed: bool,
    app: Arc<AppSettings>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Creates an unbound context owned by `app`.
    #[must_use]
    pub fn new(app: Arc<AppSettings>) -> Self {
        Self {
            request: Request::default(),
            response: ResponseWriter::detached(),
            ended: false,
            hooks: Vec::new(),
            hooks_closed: false,
            app,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context bound to `request` whose response goes nowhere.
    ///
    /// Useful for exercising a single middleware in isolation.
    #[must_use]
    pub fn with_request(app: Arc<AppSettings>, request: Request) -> Self {
        let mut ctx = Self::new(app);
        ctx.request = request;
        ctx
    }

    /// Rebinds this context to a new request cycle.
    pub(crate) fn bind(&mut self, request: Request, sink: ResponseSink) {
        self.clear();
        self.request = request;
        self.response = ResponseWriter::new(sink);
        self.started_at = Instant::now();
    }

    /// Restores every field to its default, dropping the request and response.
    pub(crate) fn clear(&mut self) {
        self.request = Request::default();
        self.response = ResponseWriter::detached();
        self.ended = false;
        self.hooks.clear();
        self.hooks_closed = false;
        self.extensions.clear();
    }

    /// The inbound request.
    #[must_use]
    pub fn req(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the inbound request.
    pub fn req_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The response being built.
    #[must_use]
    pub fn res(&self) -> &ResponseWriter {
        &self.response
    }

    /// Mutable access to the response being built.
    pub fn res_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Borrows the request and the response at the same time.
    pub fn parts_mut(&mut self) -> (&Request, &mut ResponseWriter) {
        (&self.request, &mut self.response)
    }

    /// Settings of the owning application.
    #[must_use]
    pub fn app(&self) -> &AppSettings {
        &self.app
    }

    /// Stops the chain after the current middleware returns.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Whether the chain has been stopped.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Queues a hook to run once the chain finishes successfully.
    ///
    /// Hooks run in the order they were queued and are discarded if the
    /// request fails. Hooks queued after the hooks have started running are
    /// dropped.
    pub fn after<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut Context) + Send + 'static,
    {
        if self.hooks_closed {
            tracing::warn!("after-hook queued too late, ignoring");
            return;
        }
        self.hooks.push(Box::new(hook));
    }

    /// Number of hooks waiting to run.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Runs every queued hook in order.
    pub fn run_after_hooks(&mut self) {
        self.hooks_closed = true;
        let hooks = std::mem::take(&mut self.hooks);
        for hook in hooks {
            hook(self);
        }
    }

    /// Drops every queued hook without running it.
    pub fn discard_after_hooks(&mut self) {
        self.hooks_closed = true;
        self.hooks.clear();
    }

    /// Sets `Content-Type` from a shorthand (`"json"`, `"text"`, ...) or a
    /// full MIME type. An empty string removes the header.
    pub fn set_type(&mut self, kind: &str) {
        if kind.is_empty() {
            self.response.headers_mut().remove(CONTENT_TYPE);
            return;
        }
        match HeaderValue::from_str(mime::expand(kind)) {
            Ok(value) => self.response.set_header(CONTENT_TYPE, value),
            Err(_) => tracing::warn!(content_type = kind, "invalid content type ignored"),
        }
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// Writes a plain text response.
    pub fn text(&mut self, status: StatusCode, body: impl Into<String>) {
        self.set_type("text");
        self.set_status(status);
        self.response.set_body(body.into());
    }

    /// Writes an HTML response.
    pub fn html(&mut self, status: StatusCode, body: impl Into<String>) {
        self.set_type("html");
        self.set_status(status);
        self.response.set_body(body.into());
    }

    /// Serializes `value` as the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns the serialization error; the response is left untouched.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), Failure> {
        let body = serde_json::to_vec(value)?;
        self.set_type("json");
        self.set_status(status);
        self.response.set_body(body);
        Ok(())
    }

    /// Commits the response. Returns `false` if it was already committed.
    pub fn commit(&mut self) -> bool {
        self.response.commit()
    }

    /// Sends an error to the application's error sink.
    pub fn report(&self, error: &(dyn std::error::Error + 'static)) {
        self.app.report(error);
    }

    /// When the current request started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the current request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed value for later middleware.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Whether a value of type `T` is stored.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("ended", &self.ended)
            .field("pending_hooks", &self.hooks.len())
            .field("committed", &self.response.is_committed())
            .finish_non_exhaustive()
    }
}
