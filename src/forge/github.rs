//! forge::github
//!
//! GitHub provider using the REST commits endpoint.
//!
//! # Design
//!
//! One request per lookup:
//!
//! ```text
//! GET {api_base}/repos/{owner}/{repo}/commits/{ref}
//! ```
//!
//! with `api_base` defaulting to `https://api.github.com`. The `sha` field of
//! the JSON body is the result. Owner and repo come from the first two path
//! segments of the repository URL; further segments are ignored.
//!
//! # Authentication
//!
//! - Token auth: `Authorization: token {t}`
//! - Basic auth: standard HTTP Basic
//! - Empty credentials: no header
//!
//! # Rate Limiting
//!
//! Rate-limit responses surface as ordinary `API error: ...` failures. This
//! implementation does not retry.
//!
//! # Example
//!
//! ```ignore
//! use headwatch::forge::github::GitHubProvider;
//! use headwatch::forge::{Auth, Provider};
//! use headwatch::http::CancelSignal;
//! use std::sync::Arc;
//!
//! let provider = GitHubProvider::new(Arc::new(reqwest::Client::new()));
//! let sha = provider
//!     .get_latest_commit(
//!         &CancelSignal::new(),
//!         "https://github.com/octocat/Hello-World",
//!         "master",
//!         &Auth::token("ghp_xxx"),
//!     )
//!     .await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_encode, CONTROLS};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

use super::hosts::HostSet;
use super::request::{
    build_get, decode_body, decoded_path, parse_repo_url, send, trim_slashes, DEFAULT_USER_AGENT,
    REASON_BAD_REQUEST,
    REASON_NOT_FOUND,
};
use super::traits::{Auth, Provider, ProviderError};
use crate::http::{CancelSignal, HttpResponse, HttpTransport};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default host claimed by the GitHub provider.
pub const DEFAULT_HOST: &str = "github.com";

/// Media type requested from the REST API.
const ACCEPT_VALUE: &str = "application/vnd.github.v3+json";

/// GitHub provider.
///
/// Immutable after construction. The transport is shared, so cloning the
/// provider is cheap.
#[derive(Clone)]
pub struct GitHubProvider {
    /// HTTP transport for making requests
    transport: Arc<dyn HttpTransport>,
    /// Hosts routed to this provider
    hosts: HostSet,
    /// API base URL (configurable for explicitly configured GitHub Enterprise hosts)
    api_base: String,
    /// User-Agent header value
    user_agent: String,
}

impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("hosts", &self.hosts)
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitHubProvider {
    /// Create a provider for `github.com` using the public API.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_api_base(transport, HostSet::new([DEFAULT_HOST]), DEFAULT_API_BASE)
    }

    /// Create a provider for custom hosts and a custom API base URL.
    ///
    /// # Arguments
    ///
    /// * `transport` - HTTP transport
    /// * `hosts` - Hosts routed to this provider
    /// * `api_base` - API base URL without trailing slash
    ///   (e.g., `https://github.example.com/api/v3`)
    pub fn with_api_base(
        transport: Arc<dyn HttpTransport>,
        hosts: HostSet,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            hosts,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Override the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the commits endpoint URL.
    ///
    /// `owner`, `repo` and `reference` are inserted verbatim.
    pub fn commit_url(&self, owner: &str, repo: &str, reference: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, owner, repo, reference
        )
    }

    /// Build request headers for `auth`.
    fn headers(&self, repo_url: &str, auth: &Auth) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let authorization = if let Some(token) = auth.bearer() {
            Some(format!("token {}", token))
        } else {
            auth.credentials().map(|(user, password)| {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
            })
        };

        if let Some(value) = authorization {
            // Never echo the value: it may carry the credential.
            let mut value = HeaderValue::from_str(&value)
                .map_err(|_| ProviderError::parse(repo_url, REASON_BAD_REQUEST))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Map a response to a commit hash or a classified error.
    fn handle_response(
        &self,
        repo_url: &str,
        response: HttpResponse,
    ) -> Result<String, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let commit: GitHubCommit = decode_body(repo_url, &response.body)?;
                Ok(commit.sha)
            }
            StatusCode::NOT_FOUND => Err(ProviderError::api(repo_url, REASON_NOT_FOUND)),
            _ => {
                // A malformed error body is not news; the status already says it failed.
                let message = serde_json::from_slice::<GitHubErrorResponse>(&response.body)
                    .map(|err| err.message)
                    .unwrap_or_default();
                Err(ProviderError::api(
                    repo_url,
                    format!("API error: {}", message),
                ))
            }
        }
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn hosts(&self) -> &HostSet {
        &self.hosts
    }

    async fn get_latest_commit(
        &self,
        cancel: &CancelSignal,
        repo_url: &str,
        reference: &str,
        auth: &Auth,
    ) -> Result<String, ProviderError> {
        let (owner, repo) = parse_github_url(repo_url)?;
        let api_url = self.commit_url(&owner, &repo, reference);
        let headers = self.headers(repo_url, auth)?;
        let request = build_get(repo_url, &api_url, &self.user_agent, headers)?;

        let response = send(
            self.transport.as_ref(),
            cancel,
            self.name(),
            repo_url,
            request,
        )
        .await?;

        self.handle_response(repo_url, response)
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

/// Commit object returned by `GET /repos/{owner}/{repo}/commits/{ref}`.
#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    #[serde(default)]
    message: String,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Parse a GitHub repository URL into `(owner, repo)`.
///
/// The path is split on `/` after trimming leading and trailing slashes.
/// Segment 0 is the owner and segment 1 the repo, with one trailing `.git`
/// removed from the repo. Segments beyond the second are ignored. The host
/// is not checked here; that is [`Provider::is_supported`]'s job.
///
/// # Errors
///
/// A `parse` error when the URL is malformed or has fewer than two segments.
///
/// # Example
///
/// ```
/// use headwatch::forge::github::parse_github_url;
///
/// let (owner, repo) = parse_github_url("https://github.com/octocat/Hello-World.git").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "Hello-World");
///
/// assert!(parse_github_url("https://github.com/only-one-segment").is_err());
/// ```
pub fn parse_github_url(repo_url: &str) -> Result<(String, String), ProviderError> {
    let url = parse_repo_url(repo_url)?;
    let path = decoded_path(&url);

    let parts: Vec<&[u8]> = trim_slashes(&path).split(|b| *b == b'/').collect();
    if parts.len() < 2 {
        return Err(ProviderError::parse(
            repo_url,
            format!(
                "URL path must have at least 2 parts: {}",
                String::from_utf8_lossy(&path)
            ),
        ));
    }

    let owner = segment_to_string(parts[0]);
    let repo = segment_to_string(parts[1].strip_suffix(b".git").unwrap_or(parts[1]));
    Ok((owner, repo))
}

/// A decoded path segment as text. Bytes that are not valid UTF-8 are
/// re-escaped, so they reach the API exactly as the caller wrote them.
fn segment_to_string(segment: &[u8]) -> String {
    match std::str::from_utf8(segment) {
        Ok(text) => text.to_string(),
        Err(_) => percent_encode(segment, CONTROLS).to_string(),
    }
}
