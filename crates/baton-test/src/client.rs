//! In-memory client that dispatches straight into an application.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use baton_server::{App, Dispatcher};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// Sends requests through an app's full dispatch path without a socket.
///
/// Requests go through the same pool, chain, recovery frame and error
/// translation as a live server; only the hyper layer is skipped.
///
/// ```
/// use baton_server::App;
/// use baton_test::TestClient;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let app = App::new().use_sync_fn("hello", |ctx| {
///     ctx.text(StatusCode::OK, "hi");
///     Ok(())
/// });
/// let client = TestClient::new(app).unwrap();
/// let response = client.get("/").send().await.unwrap();
/// response.assert_status(200).assert_body("hi");
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct TestClient {
    dispatcher: Dispatcher,
    default_headers: HeaderMap,
}

impl TestClient {
    /// Builds a client for `app`. Fails when the app has no middleware.
    pub fn new(app: App) -> Result<Self, TestError> {
        Ok(Self::from_dispatcher(app.into_dispatcher()?))
    }

    /// Wraps an existing dispatcher.
    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request unless the request overrides it.
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// The underlying dispatcher, for pool inspection.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
        }
    }

    /// Dispatches a prepared request.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let mut request = request.into_request()?;
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }
        let response = self.dispatcher.dispatch(request).await;
        TestResponse::collect(response).await
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Builds and dispatches the request.
    pub async fn send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}

impl std::fmt::Debug for TestClientRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClientRequest")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
