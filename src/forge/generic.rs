//! forge::generic
//!
//! Wildcard provider that claims every URL and always declines.
//!
//! Registered last, it turns "no API path for this host" into an explicit
//! `generic` error so the caller knows to fall back to a full-clone Git
//! client. It claims no hosts yet reports every URL as supported.

use async_trait::async_trait;

use super::hosts::HostSet;
use super::traits::{Auth, Provider, ProviderError};
use crate::http::CancelSignal;

/// Reason carried by the delegation error.
pub const DELEGATE_REASON: &str = "generic provider delegates to go-git";

/// The always-supported fallback provider.
///
/// # Example
///
/// ```
/// use headwatch::forge::{GenericProvider, Provider};
///
/// let generic = GenericProvider::new();
/// assert!(generic.is_supported("https://example.com/a/b"));
/// assert!(generic.is_supported("not even a url"));
/// assert!(generic.hosts().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenericProvider {
    hosts: HostSet,
}

impl GenericProvider {
    /// Create the wildcard provider.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Provider for GenericProvider {
    fn name(&self) -> &str {
        "generic"
    }

    fn hosts(&self) -> &HostSet {
        &self.hosts
    }

    fn is_wildcard(&self) -> bool {
        true
    }

    fn is_supported(&self, _repo_url: &str) -> bool {
        true
    }

    async fn get_latest_commit(
        &self,
        _cancel: &CancelSignal,
        repo_url: &str,
        _reference: &str,
        _auth: &Auth,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::generic(repo_url, DELEGATE_REASON))
    }
}
