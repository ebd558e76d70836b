//! forge::request
//!
//! The round-trip shared by every HTTP-backed provider.
//!
//! Adapters differ in URL layout, headers and which JSON field carries the
//! hash. What they share lives here: building the request, binding it to
//! the cancel signal, mapping transport failures, and decoding the body.

use log::debug;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;

use super::traits::ProviderError;
use crate::http::{CancelSignal, HttpResponse, HttpTransport};

/// User-Agent header value for API requests.
pub const DEFAULT_USER_AGENT: &str = "Watchtower-Git-Monitor";

pub(crate) const REASON_NETWORK: &str = "network error";
pub(crate) const REASON_NOT_FOUND: &str = "repository or reference not found";
pub(crate) const REASON_BAD_RESPONSE: &str = "failed to parse API response";
pub(crate) const REASON_BAD_REQUEST: &str = "failed to build API request";

/// Parse `repo_url`, mapping failure to a `parse` error.
pub(crate) fn parse_repo_url(repo_url: &str) -> Result<Url, ProviderError> {
    Url::parse(repo_url).map_err(|e| {
        ProviderError::parse(repo_url, format!("failed to parse repository URL: {}", e))
            .with_cause(e)
    })
}

/// Build a GET request for `api_url` carrying `headers` plus the User-Agent.
pub(crate) fn build_get(
    repo_url: &str,
    api_url: &str,
    user_agent: &str,
    mut headers: HeaderMap,
) -> Result<Request, ProviderError> {
    let url = Url::parse(api_url)
        .map_err(|e| ProviderError::parse(repo_url, REASON_BAD_REQUEST).with_cause(e))?;

    let agent = HeaderValue::from_str(user_agent)
        .map_err(|e| ProviderError::parse(repo_url, REASON_BAD_REQUEST).with_cause(e))?;
    headers.insert(USER_AGENT, agent);

    let mut request = Request::new(Method::GET, url);
    *request.headers_mut() = headers;
    Ok(request)
}

/// Send `request` through `transport`, bound to `cancel`.
///
/// Every transport-level failure, including cancellation and deadline
/// expiry, becomes `api` / "network error" with the transport error as cause.
pub(crate) async fn send(
    transport: &dyn HttpTransport,
    cancel: &CancelSignal,
    provider: &str,
    repo_url: &str,
    request: Request,
) -> Result<HttpResponse, ProviderError> {
    debug!("[{}] {} {}", provider, request.method(), request.url());

    let response = cancel
        .run(transport.send(request))
        .await
        .map_err(|e| {
            debug!("[{}] transport error for {}: {}", provider, repo_url, e);
            ProviderError::api(repo_url, REASON_NETWORK).with_cause(e)
        })?;

    debug!("[{}] {} responded {}", provider, repo_url, response.status);
    Ok(response)
}

/// Decode a success body, mapping failure to `api` / "failed to parse API response".
pub(crate) fn decode_body<T: DeserializeOwned>(
    repo_url: &str,
    body: &[u8],
) -> Result<T, ProviderError> {
    serde_json::from_slice(body)
        .map_err(|e| ProviderError::api(repo_url, REASON_BAD_RESPONSE).with_cause(e))
}

/// The percent-decoded path of `url` as raw bytes.
///
/// Decoding to bytes keeps escapes that are not valid UTF-8 intact.
pub(crate) fn decoded_path(url: &Url) -> Vec<u8> {
    percent_decode_str(url.path()).collect()
}

/// Trim leading/trailing `/`.
pub(crate) fn trim_slashes(path: &[u8]) -> &[u8] {
    let start = path.iter().position(|b| *b != b'/').unwrap_or(path.len());
    let end = path.iter().rposition(|b| *b != b'/').map_or(start, |i| i + 1);
    &path[start..end]
}

/// Trim leading/trailing `/` and then one trailing `.git`.
pub(crate) fn trim_repo_path(path: &[u8]) -> &[u8] {
    let path = trim_slashes(path);
    path.strip_suffix(b".git").unwrap_or(path)
}
