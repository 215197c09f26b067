//! The application: middleware registration and serving entry points.

use crate::config::ServerConfig;
use crate::dispatch::{default_error_handler, Dispatcher};
use crate::error::ServerError;
use crate::server::{self, ServerListener};
use crate::shutdown::StopSignal;
use crate::tls;
use baton_core::{ErrorLog, Failure, HttpError, MiddlewareResult};
use baton_middleware::{
    from_fn, from_sync_fn, wrap_handler, AppSettings, BoxFuture, BoxedMiddleware, Chain, Context,
    Handler, Middleware,
};
use baton_telemetry::TracingErrorLog;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Translates a middleware failure into the error response, or `None` to
/// leave the response untouched.
pub type ErrorHandler = Arc<dyn Fn(&mut Context, Failure) -> Option<HttpError> + Send + Sync>;

/// A Baton application.
///
/// Middleware is registered during setup and runs in registration order for
/// every request. Serving consumes the application, so the chain can no longer
/// change once a listener is up.
///
/// # Example
///
/// ```rust,no_run
/// use baton_server::App;
/// use http::StatusCode;
///
/// # async fn run() -> Result<(), baton_server::ServerError> {
/// App::named("hello")
///     .use_sync_fn("hello", |ctx| {
///         ctx.html(StatusCode::OK, "<h1>Hello, Baton!</h1>");
///         Ok(())
///     })
///     .listen("127.0.0.1:3000")
///     .await
/// # }
/// ```
pub struct App {
    name: String,
    middleware: Vec<BoxedMiddleware>,
    on_error: ErrorHandler,
    error_log: Arc<dyn ErrorLog>,
    values: HashMap<String, serde_json::Value>,
    config: ServerConfig,
}

impl App {
    /// Creates an application named `baton`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("baton")
    }

    /// Creates an application with the given name.
    ///
    /// The name tags every event logged by the default error sink.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            error_log: Arc::new(TracingErrorLog::new(name.clone())),
            name,
            middleware: Vec::new(),
            on_error: Arc::new(default_error_handler),
            values: HashMap::new(),
            config: ServerConfig::default(),
        }
    }

    /// Application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a middleware.
    #[must_use]
    pub fn use_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an async closure as middleware.
    #[must_use]
    pub fn use_fn<F>(self, name: &'static str, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, MiddlewareResult> + Send + Sync + 'static,
    {
        self.use_middleware(from_fn(name, func))
    }

    /// Appends a synchronous closure as middleware.
    #[must_use]
    pub fn use_sync_fn<F>(self, name: &'static str, func: F) -> Self
    where
        F: Fn(&mut Context) -> MiddlewareResult + Send + Sync + 'static,
    {
        self.use_middleware(from_sync_fn(name, func))
    }

    /// Appends a plain request handler as middleware.
    #[must_use]
    pub fn use_handler(self, handler: impl Handler) -> Self {
        self.use_middleware(wrap_handler(handler))
    }

    /// Number of registered middleware.
    #[must_use]
    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }

    /// Replaces the error handler.
    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context, Failure) -> Option<HttpError> + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }

    /// Replaces the error sink.
    #[must_use]
    pub fn error_log(mut self, sink: impl ErrorLog) -> Self {
        self.error_log = Arc::new(sink);
        self
    }

    /// Stores a setting readable by middleware through `ctx.app().get(key)`.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Replaces the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sends an error to the application's error sink.
    pub fn error(&self, error: &(dyn std::error::Error + 'static)) {
        self.error_log.report(error);
    }

    /// Freezes the middleware into a [`Dispatcher`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NoMiddleware`] if nothing was registered.
    pub fn into_dispatcher(self) -> Result<Dispatcher, ServerError> {
        self.into_parts().map(|(dispatcher, _)| dispatcher)
    }

    fn into_parts(self) -> Result<(Dispatcher, ServerConfig), ServerError> {
        if self.middleware.is_empty() {
            return Err(ServerError::NoMiddleware);
        }

        let settings = AppSettings::new(self.name, self.error_log).with_values(self.values);
        let dispatcher = Dispatcher::new(
            Chain::new(self.middleware),
            Arc::new(settings),
            self.on_error,
        );
        Ok((dispatcher, self.config))
    }

    /// Serves HTTP on `addr` until the listener fails.
    ///
    /// An address of the form `:port` binds every interface.
    pub async fn listen(self, addr: &str) -> Result<(), ServerError> {
        let (dispatcher, config) = self.into_parts()?;
        let listener = server::bind(addr).await?;
        server::serve(listener, dispatcher, config, None, StopSignal::new()).await
    }

    /// Serves HTTPS on `addr` with a PEM certificate chain and private key.
    pub async fn listen_tls(
        self,
        addr: &str,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<(), ServerError> {
        let (dispatcher, config) = self.into_parts()?;
        let acceptor = tls::load_acceptor(cert_path.as_ref(), key_path.as_ref())?;
        let listener = server::bind(addr).await?;
        server::serve(listener, dispatcher, config, Some(acceptor), StopSignal::new()).await
    }

    /// Binds immediately and serves in a background task.
    ///
    /// Without an address the configured default (`127.0.0.1:0`, a random
    /// port) is used; read the actual one from [`ServerListener::local_addr`].
    pub async fn start(self, addr: Option<&str>) -> Result<ServerListener, ServerError> {
        let (dispatcher, config) = self.into_parts()?;
        let listener = server::bind(start_addr(addr, &config)).await?;
        server::spawn(listener, dispatcher, config, None)
    }

    /// Like [`start`](Self::start), serving HTTPS with a PEM certificate
    /// chain and private key.
    pub async fn start_tls(
        self,
        addr: Option<&str>,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<ServerListener, ServerError> {
        let (dispatcher, config) = self.into_parts()?;
        let acceptor = tls::load_acceptor(cert_path.as_ref(), key_path.as_ref())?;
        let listener = server::bind(start_addr(addr, &config)).await?;
        server::spawn(listener, dispatcher, config, Some(acceptor))
    }
}

fn start_addr<'a>(addr: Option<&'a str>, config: &'a ServerConfig) -> &'a str {
    addr.filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| config.default_addr())
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_empty_app_fails_fast() {
        let err = App::new().into_dispatcher().unwrap_err();
        assert!(matches!(err, ServerError::NoMiddleware));
    }

    #[tokio::test]
    async fn test_start_without_middleware_binds_nothing() {
        let result = App::new().start(None).await;
        assert!(matches!(result, Err(ServerError::NoMiddleware)));
    }

    #[test]
    fn test_registration_order_preserved() {
        let dispatcher = App::new()
            .use_sync_fn("first", |_| Ok(()))
            .use_fn("second", |_| Box::pin(async { Ok(()) }))
            .use_handler(|_: &baton_middleware::Request, _: &mut baton_middleware::ResponseWriter| {})
            .into_dispatcher()
            .unwrap();

        assert_eq!(dispatcher.middleware_names(), vec!["first", "second", "handler"]);
    }

    #[test]
    fn test_settings_carried_to_dispatcher() {
        let dispatcher = App::named("orders")
            .set("region", "eu")
            .set("replicas", 3)
            .use_sync_fn("noop", |_| Ok(()))
            .into_dispatcher()
            .unwrap();

        assert_eq!(dispatcher.settings().name(), "orders");
        assert_eq!(dispatcher.settings().get("region").unwrap(), "eu");
        assert_eq!(dispatcher.settings().get("replicas").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_custom_error_handler_can_swallow() {
        let dispatcher = App::new()
            .use_sync_fn("fails", |ctx| {
                ctx.text(StatusCode::ACCEPTED, "queued");
                Err(Failure::msg("ignored"))
            })
            .on_error(|_, _| None)
            .into_dispatcher()
            .unwrap();

        let response = dispatcher.dispatch(baton_middleware::Request::default()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_error_reaches_sink() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let app = App::new().error_log(move |err: &(dyn std::error::Error + 'static)| {
            captured.lock().unwrap().push(err.to_string());
        });

        app.error(&HttpError::new(500, "disk full"));

        assert_eq!(*seen.lock().unwrap(), vec!["disk full".to_string()]);
    }
}
