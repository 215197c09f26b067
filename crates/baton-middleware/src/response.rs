//! Buffered response writer with a single-use commit.

use crate::types::{Response, ResponseSink};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

/// Accumulates status, headers and body until the response is committed.
///
/// Committing builds the wire response and hands it to the sink bound for the
/// current request. The first commit wins; every later call is a no-op, and
/// status or body changes made after it are ignored.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    body_written: bool,
    committed: bool,
    sink: Option<ResponseSink>,
}

impl ResponseWriter {
    /// Creates a writer that delivers to `sink` on commit.
    #[must_use]
    pub fn new(sink: ResponseSink) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    /// Creates a writer with nowhere to deliver.
    ///
    /// Committing still flips the committed flag.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// The explicitly set status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status that a commit right now would send.
    #[must_use]
    pub fn effective_status(&self) -> StatusCode {
        self.status.unwrap_or(if self.body_written {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        })
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        if !self.committed {
            self.status = Some(status);
        }
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    ///
    /// Edits after commit have no effect on the delivered response.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.committed {
            self.headers.insert(name, value);
        }
    }

    /// The current `Content-Type` header as text.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        if !self.committed {
            self.body.extend_from_slice(chunk.as_ref());
            self.body_written = true;
        }
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        if !self.committed {
            self.body = body.into();
            self.body_written = true;
        }
    }

    /// The body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Drops status, headers and body written so far.
    pub fn clear(&mut self) {
        if !self.committed {
            self.status = None;
            self.headers.clear();
            self.body.clear();
            self.body_written = false;
        }
    }

    /// Whether the response has been committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Builds the response and delivers it to the sink.
    ///
    /// Returns `true` only for the call that actually committed.
    pub fn commit(&mut self) -> bool {
        if self.committed {
            return false;
        }
        self.committed = true;

        let mut response = Response::new(Full::new(Bytes::from(std::mem::take(&mut self.body))));
        *response.status_mut() = self.effective_status();
        *response.headers_mut() = std::mem::take(&mut self.headers);

        if let Some(sink) = self.sink.take() {
            if sink.send(response).is_err() {
                tracing::debug!("response receiver dropped before commit");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::response_channel;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_commit_delivers_response() {
        let (sink, receiver) = response_channel();
        let mut writer = ResponseWriter::new(sink);
        writer.set_status(StatusCode::CREATED);
        writer.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.write("hello ");
        writer.write("world");

        assert!(writer.commit());

        let response = receiver.await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello world");
    }

    #[test]
    fn test_second_commit_is_noop() {
        let (sink, mut receiver) = response_channel();
        let mut writer = ResponseWriter::new(sink);
        writer.write("once");

        assert!(writer.commit());
        assert!(!writer.commit());
        assert!(writer.is_committed());

        let response = receiver.try_recv().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_mutations_after_commit_are_ignored() {
        let mut writer = ResponseWriter::detached();
        writer.set_status(StatusCode::ACCEPTED);
        writer.commit();

        writer.set_status(StatusCode::BAD_GATEWAY);
        writer.write("late");

        assert_eq!(writer.status(), Some(StatusCode::ACCEPTED));
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_unset_status_defaults() {
        let empty = ResponseWriter::detached();
        assert_eq!(empty.effective_status(), StatusCode::NOT_FOUND);

        let mut with_body = ResponseWriter::detached();
        with_body.set_body("x");
        assert_eq!(with_body.effective_status(), StatusCode::OK);
    }

    #[test]
    fn test_clear_resets_state() {
        let mut writer = ResponseWriter::detached();
        writer.set_status(StatusCode::IM_A_TEAPOT);
        writer.set_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        writer.write("partial");

        writer.clear();

        assert_eq!(writer.status(), None);
        assert!(writer.headers().is_empty());
        assert!(writer.body().is_empty());
        assert_eq!(writer.effective_status(), StatusCode::NOT_FOUND);
    }
}
