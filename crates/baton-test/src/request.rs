//! Request construction for in-memory dispatch.

use crate::error::TestError;
use baton_core::mime;
use baton_middleware::Request;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// A request ready to be handed to a [`TestClient`](crate::TestClient).
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request target, path plus optional query
    pub uri: http::Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Buffered request body
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts into the request type the dispatcher consumes.
    pub fn into_request(self) -> Result<Request, TestError> {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

/// Fluent builder for [`TestRequest`].
///
/// Invalid header names or values are remembered and surface from
/// [`build`](Self::build) rather than panicking mid-chain.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for the given method and target.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(format!("invalid header name: {e}")),
            (_, Err(e)) => self.fail(format!("invalid header value: {e}")),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and marks it as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type(mime::APPLICATION_JSON)
            }
            Err(e) => {
                self.error.get_or_insert(TestError::Json(e));
                self
            }
        }
    }

    /// Finishes the request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI {:?}: {e}", self.uri)))?;
        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body,
        })
    }

    fn fail(&mut self, message: String) {
        self.error.get_or_insert(TestError::RequestBuild(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_get() {
        let request = TestRequest::get("/users?page=2").build().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.uri.path(), "/users");
        assert_eq!(request.uri.query(), Some("page=2"));
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequest::post("/items")
            .json(&json!({"name": "widget"}))
            .build()
            .unwrap();
        assert_eq!(request.headers[header::CONTENT_TYPE], mime::APPLICATION_JSON);
        assert_eq!(&request.body[..], br#"{"name":"widget"}"#);
    }

    #[test]
    fn test_invalid_header_surfaces_on_build() {
        let result = TestRequest::get("/").header("bad header", "x").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("http://[::1").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_into_request_keeps_headers() {
        let request = TestRequest::put("/x")
            .header("x-trace", "abc")
            .body("payload")
            .build()
            .unwrap()
            .into_request()
            .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.headers()["x-trace"], "abc");
        assert_eq!(&request.body()[..], b"payload");
    }
}
