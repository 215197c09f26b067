//! # Baton Test
//!
//! In-memory testing for baton applications. A [`TestClient`] feeds requests
//! straight into the app's dispatcher, so the pool, the middleware chain,
//! panic recovery and error translation all run exactly as they would behind
//! a socket.
//!
//! ```
//! use baton_core::HttpError;
//! use baton_server::App;
//! use baton_test::{RecordingErrorLog, TestClient};
//!
//! # tokio_test::block_on(async {
//! let errors = RecordingErrorLog::new();
//! let app = App::new()
//!     .error_log(errors.clone())
//!     .use_sync_fn("missing", |_| Err(HttpError::new(404, "no such user").into()));
//!
//! let client = TestClient::new(app).unwrap();
//! client.get("/users/9").send().await.unwrap()
//!     .assert_status(404)
//!     .assert_body("no such user");
//! assert!(errors.is_empty());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/baton-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod recorder;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use recorder::RecordingErrorLog;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
