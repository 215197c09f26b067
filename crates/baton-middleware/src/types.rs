//! Common types used throughout the middleware chain.

use bytes::Bytes;
use http_body_util::Full;
use tokio::sync::oneshot;

/// The HTTP request seen by middleware.
///
/// The body is fully buffered before dispatch.
pub type Request = http::Request<Bytes>;

/// The committed HTTP response.
pub type Response = http::Response<Full<Bytes>>;

/// Where a committed response is delivered.
pub type ResponseSink = oneshot::Sender<Response>;

/// Receiving half paired with a [`ResponseSink`].
pub type ResponseReceiver = oneshot::Receiver<Response>;

/// Creates a connected sink/receiver pair for one request.
#[must_use]
pub fn response_channel() -> (ResponseSink, ResponseReceiver) {
    oneshot::channel()
}
