//! Listener and connection handling.
//!
//! One task is spawned per accepted connection; each connection is served by
//! hyper's HTTP/1 implementation and every request on it goes through the
//! application's [`Dispatcher`].

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use baton_middleware::{Request, Response};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::StopSignal;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Handle to a server started with [`App::start`](crate::App::start).
///
/// Closing stops accepting new connections; requests already in progress
/// are allowed to finish.
#[derive(Debug)]
pub struct ServerListener {
    local_addr: SocketAddr,
    stop: StopSignal,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerListener {
    /// The address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes the listening socket.
    pub fn close(&self) {
        self.stop.trigger();
    }

    /// Waits for the serve loop to exit and returns its result.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.task.await?
    }
}

/// Rewrites `:port` to `0.0.0.0:port`.
pub(crate) fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_owned()
    }
}

pub(crate) async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let addr = normalize_addr(addr);
    TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

pub(crate) fn spawn(
    listener: TcpListener,
    dispatcher: Dispatcher,
    config: ServerConfig,
    tls: Option<TlsAcceptor>,
) -> Result<ServerListener, ServerError> {
    let local_addr = listener.local_addr()?;
    let stop = StopSignal::new();
    let task = tokio::spawn(serve(listener, dispatcher, config, tls, stop.clone()));

    Ok(ServerListener {
        local_addr,
        stop,
        task,
    })
}

pub(crate) async fn serve(
    listener: TcpListener,
    dispatcher: Dispatcher,
    config: ServerConfig,
    tls: Option<TlsAcceptor>,
    stop: StopSignal,
) -> Result<(), ServerError> {
    let local_addr = listener.local_addr()?;
    tracing::info!(
        app = dispatcher.settings().name(),
        addr = %local_addr,
        tls = tls.is_some(),
        "listening"
    );

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote_addr)) => {
                        let dispatcher = dispatcher.clone();
                        let config = config.clone();
                        let tls = tls.clone();

                        tokio::spawn(async move {
                            match tls {
                                Some(acceptor) => match acceptor.accept(stream).await {
                                    Ok(stream) => {
                                        serve_connection(stream, remote_addr, dispatcher, &config).await;
                                    }
                                    Err(e) => {
                                        tracing::debug!(remote = %remote_addr, error = %e, "TLS handshake failed");
                                    }
                                },
                                None => serve_connection(stream, remote_addr, dispatcher, &config).await,
                            }
                        });
                    }
                    Err(e) => accept_failed(e).await?,
                }
            }

            () = stop.triggered() => {
                break;
            }
        }
    }

    drop(listener);
    tracing::info!(addr = %local_addr, "listener closed");
    Ok(())
}

/// Handles a failed `accept`: transient errors are logged and retried after
/// a short pause, anything else ends the serve loop.
async fn accept_failed(err: io::Error) -> Result<(), ServerError> {
    if is_transient(&err) {
        tracing::warn!(error = %err, "failed to accept connection, retrying");
        tokio::time::sleep(ACCEPT_BACKOFF).await;
        Ok(())
    } else {
        tracing::error!(error = %err, "listener failed");
        Err(ServerError::Io(err))
    }
}

/// Per-connection failures and descriptor exhaustion leave the listener usable.
fn is_transient(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    ) {
        return true;
    }
    is_resource_exhaustion(err)
}

#[cfg(unix)]
fn is_resource_exhaustion(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_err: &io::Error) -> bool {
    false
}

async fn serve_connection<S>(
    stream: S,
    remote_addr: SocketAddr,
    dispatcher: Dispatcher,
    config: &ServerConfig,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let limit = config.max_body_size();
    let service = service_fn(move |req: http::Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move { Ok::<_, Infallible>(handle_request(&dispatcher, req, limit).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(config.keep_alive())
        .half_close(config.half_close())
        .serve_connection(TokioIo::new(stream), service);

    if let Err(e) = conn.await {
        tracing::debug!(remote = %remote_addr, error = %e, "connection error");
    }
}

/// Buffers the body, then dispatches.
async fn handle_request(dispatcher: &Dispatcher, req: http::Request<Incoming>, limit: usize) -> Response {
    let (parts, body) = req.into_parts();

    match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let request = Request::from_parts(parts, collected.to_bytes());
            dispatcher.dispatch(request).await
        }
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::debug!(http.path = %parts.uri.path(), limit, "request body too large");
            plain_response(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Err(e) => {
            tracing::debug!(http.path = %parts.uri.path(), error = %e, "failed to read request body");
            plain_response(StatusCode::BAD_REQUEST)
        }
    }
}

fn plain_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from_static(reason.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(baton_core::mime::TEXT_PLAIN),
    );
    response
}
