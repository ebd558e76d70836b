//! http::mock
//!
//! Recording transport for deterministic tests.
//!
//! # Design
//!
//! `MockTransport` answers every request with a configured outcome and keeps
//! a copy of each request it saw, so tests can assert on the exact URL and
//! headers an adapter produced and on how many round-trips it made.
//!
//! # Example
//!
//! ```
//! use headwatch::http::mock::MockTransport;
//! use headwatch::http::HttpTransport;
//! use reqwest::{Method, Request, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::respond(StatusCode::OK, r#"{"sha":"abc"}"#);
//! let request = Request::new(Method::GET, "https://example.com/x".parse().unwrap());
//!
//! let response = transport.send(request).await.unwrap();
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(transport.request_count(), 1);
//! assert_eq!(transport.requests()[0].url, "https://example.com/x");
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, StatusCode};

use super::{HttpResponse, HttpTransport, TransportError};

/// A request as observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Full request URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
}

impl RecordedRequest {
    /// Header value as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// What the mock does with each request.
#[derive(Debug, Clone)]
enum Outcome {
    Respond(HttpResponse),
    Fail(String),
    Hang,
}

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share the
/// request log.
#[derive(Debug, Clone)]
pub struct MockTransport {
    outcome: Outcome,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Answer every request with `status` and `body`.
    pub fn respond(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::with_outcome(Outcome::Respond(HttpResponse::new(status, body)))
    }

    /// Fail every request with [`TransportError::Unavailable`].
    pub fn fail(message: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Fail(message.into()))
    }

    /// Never answer. Only a cancel signal ends the call.
    pub fn hang() -> Self {
        Self::with_outcome(Outcome::Hang)
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
        });

        match &self.outcome {
            Outcome::Respond(response) => Ok(response.clone()),
            Outcome::Fail(message) => Err(TransportError::Unavailable(message.clone())),
            Outcome::Hang => std::future::pending().await,
        }
    }
}
