//! http
//!
//! The transport seam consumed by the forge adapters.
//!
//! # Design
//!
//! Adapters build a complete [`reqwest::Request`] (method, URL, headers) and
//! hand it to an [`HttpTransport`]. The transport returns the status, headers
//! and the fully drained body, so no response stream outlives the call that
//! produced it. Timeouts, TLS and proxies belong to the transport; the
//! caller supplies it and it must be safe for concurrent use.
//!
//! Every call is bound to a [`CancelSignal`]. Firing the signal or passing its
//! deadline aborts the round-trip with a [`TransportError`].
//!
//! # Example
//!
//! ```
//! use headwatch::http::{CancelSignal, TransportError};
//!
//! # tokio_test::block_on(async {
//! let cancel = CancelSignal::new();
//! cancel.cancel();
//!
//! let result: Result<(), TransportError> = cancel
//!     .run(std::future::pending())
//!     .await;
//! assert!(matches!(result, Err(TransportError::Cancelled)));
//! # });
//! ```

pub mod mock;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, StatusCode};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors raised below the HTTP status level.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying client failed (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The call's cancel signal fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The call's deadline passed before the response arrived.
    #[error("request deadline exceeded")]
    TimedOut,

    /// The transport could not reach the remote end.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// A response with its body already read to completion.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Entire response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Sends one fully-formed request and returns the drained response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request`, returning the response or a transport-level error.
    ///
    /// Non-2xx statuses are responses, not errors.
    async fn send(&self, request: Request) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl HttpTransport for Client {
    async fn send(&self, request: Request) -> Result<HttpResponse, TransportError> {
        let response = Client::execute(self, request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Per-call cancellation handle with an optional deadline.
///
/// Clones share the same underlying token, so cancelling any clone cancels
/// them all. The deadline is copied, not shared.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that only fires when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A signal that also fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Bind to an existing token, e.g. a child of a service-wide shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Fire the signal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the signal has fired, by cancellation or by deadline.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` until it completes or the signal fires.
    ///
    /// Cancellation wins over a future that is ready at the same time.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TransportError::Cancelled),
            _ = deadline => Err(TransportError::TimedOut),
            result = fut => result,
        }
    }
}
