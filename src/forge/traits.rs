//! forge::traits
//!
//! Provider trait definition for resolving refs on hosted Git services.
//!
//! # Design
//!
//! The `Provider` trait is async because resolving a ref involves one HTTP
//! round-trip. Everything else a provider does (URL matching, URL parsing,
//! header construction) is synchronous.
//!
//! Providers are immutable after construction and hold no per-call state,
//! so a single value can serve any number of concurrent callers.
//!
//! # Example
//!
//! ```ignore
//! use headwatch::forge::{Auth, Provider, ProviderError};
//! use headwatch::http::CancelSignal;
//!
//! async fn head_of(provider: &dyn Provider, url: &str) -> Result<String, ProviderError> {
//!     let cancel = CancelSignal::with_timeout(std::time::Duration::from_secs(10));
//!     provider
//!         .get_latest_commit(&cancel, url, "main", &Auth::None)
//!         .await
//! }
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::hosts::HostSet;
use crate::http::CancelSignal;

/// Coarse classification of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOp {
    /// The provider API was reached (or tried) and the call failed.
    Api,
    /// The repository URL could not be turned into an API request.
    Parse,
    /// No API path applies; the caller should fall back to a full clone.
    Generic,
}

impl ErrorOp {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorOp::Api => "api",
            ErrorOp::Parse => "parse",
            ErrorOp::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ErrorOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-level error carried by a [`ProviderError`].
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// The single error type returned by providers and the registry.
///
/// # Security
///
/// `url` is always the repository URL the caller passed in, never the
/// derived API URL, and no variant carries auth material.
#[derive(Debug, Clone, Error)]
#[error("{op} {url}: {reason}")]
pub struct ProviderError {
    op: ErrorOp,
    url: String,
    reason: String,
    #[source]
    cause: Option<Cause>,
}

impl ProviderError {
    /// Build an error without a cause.
    pub fn new(op: ErrorOp, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            op,
            url: url.into(),
            reason: reason.into(),
            cause: None,
        }
    }

    /// Attach a lower-level cause.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// An `api` error.
    pub fn api(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorOp::Api, url, reason)
    }

    /// A `parse` error.
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorOp::Parse, url, reason)
    }

    /// A `generic` delegation signal.
    pub fn generic(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorOp::Generic, url, reason)
    }

    /// Error classification.
    pub fn op(&self) -> ErrorOp {
        self.op
    }

    /// The repository URL passed by the caller.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Short human-readable category.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The wrapped lower-level error, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Whether the caller should fall back to a full-clone Git client.
    pub fn is_generic(&self) -> bool {
        self.op == ErrorOp::Generic
    }
}

/// Credentials for one request.
///
/// Empty strings are legal here and are demoted to "no auth" when headers
/// are built: see [`Auth::bearer`] and [`Auth::credentials`].
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Auth {
    /// Anonymous access
    #[default]
    None,
    /// Personal or project access token
    Token(String),
    /// HTTP Basic credentials
    Basic {
        /// User name
        username: String,
        /// Password or app password
        password: String,
    },
}

impl Auth {
    /// Token auth from a string.
    pub fn token(value: impl Into<String>) -> Self {
        Auth::Token(value.into())
    }

    /// Basic auth from a user name and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The token, when this is non-empty token auth.
    pub fn bearer(&self) -> Option<&str> {
        match self {
            Auth::Token(t) if !t.is_empty() => Some(t),
            _ => None,
        }
    }

    /// The credentials, when this is basic auth with both parts non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self {
            Auth::Basic { username, password } if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }

    /// Whether this carries no usable credentials.
    pub fn is_none(&self) -> bool {
        self.bearer().is_none() && self.credentials().is_none()
    }
}

// Custom Debug to avoid exposing secrets
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::None => write!(f, "Auth::None"),
            Auth::Token(_) => write!(f, "Auth::Token(<redacted>)"),
            Auth::Basic { username, .. } => f
                .debug_struct("Auth::Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// The Provider trait for resolving refs through a hosting service API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// `get_latest_commit` returns `Result<String, ProviderError>`. Callers
/// typically:
/// - fall back to a full clone when [`ProviderError::is_generic`] is true
/// - log and surface everything else
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in diagnostics (e.g., "github").
    fn name(&self) -> &str;

    /// Hosts this provider claims. Empty for the wildcard provider.
    fn hosts(&self) -> &HostSet;

    /// Whether this provider accepts every URL.
    ///
    /// Wildcard providers must be registered after all host-specific ones.
    fn is_wildcard(&self) -> bool {
        false
    }

    /// Whether `repo_url` belongs to this provider.
    fn is_supported(&self, repo_url: &str) -> bool {
        self.hosts().matches(repo_url)
    }

    /// Resolve `reference` to the full commit hash it currently points at.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Aborts the HTTP round-trip when fired
    /// * `repo_url` - Absolute repository URL
    /// * `reference` - Branch, tag or commit prefix; inserted into the API
    ///   URL without escaping
    /// * `auth` - Credentials for this request only
    ///
    /// # Errors
    ///
    /// - `parse` when `repo_url` cannot be mapped to an API URL (no request is made)
    /// - `api` for transport failures, cancellation, 404 and other non-200 statuses
    /// - `generic` from the wildcard provider
    async fn get_latest_commit(
        &self,
        cancel: &CancelSignal,
        repo_url: &str,
        reference: &str,
        auth: &Auth,
    ) -> Result<String, ProviderError>;
}
