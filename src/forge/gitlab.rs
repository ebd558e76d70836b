//! forge::gitlab
//!
//! GitLab provider using the v4 repository commits endpoint.
//!
//! # Design
//!
//! GitLab addresses projects by their full path, nested groups included,
//! escaped into a single path segment:
//!
//! ```text
//! GET {api_base}/projects/{group%2Fsub%2Fproject}/repository/commits/{ref}
//! ```
//!
//! with `api_base` defaulting to `https://gitlab.com/api/v4`. The `id` field
//! of the JSON body is the result. Error bodies are surfaced as plain text.
//!
//! # Authentication
//!
//! Token auth sends `Private-Token: {t}`. Basic auth is not honored by this
//! provider and sends nothing.

use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;

use super::hosts::HostSet;
use super::request::{
    build_get, decode_body, decoded_path, parse_repo_url, send, trim_repo_path, DEFAULT_USER_AGENT,
    REASON_BAD_REQUEST, REASON_NOT_FOUND,
};
use super::traits::{Auth, Provider, ProviderError};
use crate::http::{CancelSignal, HttpResponse, HttpTransport};

/// Default GitLab API base URL.
pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";

/// Default host claimed by the GitLab provider.
pub const DEFAULT_HOST: &str = "gitlab.com";

/// Header carrying a GitLab personal/project access token.
const PRIVATE_TOKEN: HeaderName = HeaderName::from_static("private-token");

/// Characters escaped in a single path segment.
///
/// Everything except unreserved characters and `$ & + : = @` is escaped, so
/// `/` becomes `%2F`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// GitLab provider.
#[derive(Clone)]
pub struct GitLabProvider {
    /// HTTP transport for making requests
    transport: Arc<dyn HttpTransport>,
    /// Hosts routed to this provider
    hosts: HostSet,
    /// API base URL (for explicitly configured self-hosted GitLab)
    api_base: String,
    /// User-Agent header value
    user_agent: String,
}

impl std::fmt::Debug for GitLabProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabProvider")
            .field("hosts", &self.hosts)
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitLabProvider {
    /// Create a provider for `gitlab.com` using the public API.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_api_base(transport, HostSet::new([DEFAULT_HOST]), DEFAULT_API_BASE)
    }

    /// Create a provider for custom hosts and a custom API base URL.
    ///
    /// # Arguments
    ///
    /// * `transport` - HTTP transport
    /// * `hosts` - Hosts routed to this provider
    /// * `api_base` - API base URL (e.g., `https://gitlab.example.com/api/v4`)
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

    /// Build the commits endpoint URL. `project_path` must already be escaped.
    pub fn commit_url(&self, project_path: &str, reference: &str) -> String {
        format!(
            "{}/projects/{}/repository/commits/{}",
            self.api_base, project_path, reference
        )
    }

    fn headers(&self, repo_url: &str, auth: &Auth) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth.bearer() {
            let mut value = HeaderValue::from_str(token)
                .map_err(|_| ProviderError::parse(repo_url, REASON_BAD_REQUEST))?;
            value.set_sensitive(true);
            headers.insert(PRIVATE_TOKEN, value);
        }
        Ok(headers)
    }

    fn handle_response(
        &self,
        repo_url: &str,
        response: HttpResponse,
    ) -> Result<String, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let commit: GitLabCommit = decode_body(repo_url, &response.body)?;
                Ok(commit.id)
            }
            StatusCode::NOT_FOUND => Err(ProviderError::api(repo_url, REASON_NOT_FOUND)),
            _ => Err(ProviderError::api(
                repo_url,
                format!("API error: {}", String::from_utf8_lossy(&response.body)),
            )),
        }
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn name(&self) -> &str {
        "gitlab"
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
        let project_path = parse_gitlab_url(repo_url)?;
        let api_url = self.commit_url(&project_path, reference);
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

/// Commit object returned by `GET /projects/:id/repository/commits/:sha`.
#[derive(Debug, Deserialize)]
struct GitLabCommit {
    id: String,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Parse a GitLab repository URL into its escaped project path.
///
/// Leading and trailing `/` are trimmed, then one trailing `.git`, then the
/// whole path is escaped as one segment. An empty result is allowed; the
/// API answers it with 404.
///
/// # Errors
///
/// A `parse` error when the URL is malformed.
///
/// # Example
///
/// ```
/// use headwatch::forge::gitlab::parse_gitlab_url;
///
/// assert_eq!(
///     parse_gitlab_url("https://gitlab.com/group/sub/proj.git").unwrap(),
///     "group%2Fsub%2Fproj"
/// );
/// assert_eq!(parse_gitlab_url("https://gitlab.com/").unwrap(), "");
/// ```
pub fn parse_gitlab_url(repo_url: &str) -> Result<String, ProviderError> {
    let url = parse_repo_url(repo_url)?;
    let path = decoded_path(&url);
    Ok(escape_project_path(trim_repo_path(&path)))
}

/// Escape a project path as a single URL path segment.
///
/// Bytes outside ASCII are escaped one by one, so a path that is not valid
/// UTF-8 survives unchanged.
pub fn escape_project_path(path: impl AsRef<[u8]>) -> String {
    percent_encode(path.as_ref(), PATH_SEGMENT).to_string()
}
