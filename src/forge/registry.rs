//! forge::registry
//!
//! Provider selection and dispatch.
//!
//! # Design
//!
//! The registry holds providers in dispatch order. For a repository URL it
//! picks the first provider whose `is_supported` returns true and returns
//! that provider's result unchanged. Callers never import a specific
//! provider to resolve a ref.
//!
//! # Ordering
//!
//! A wildcard provider accepts every URL, so anything after it would never
//! be reached. [`ProviderRegistry::register`] keeps host-specific providers
//! ahead of any wildcard regardless of registration order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use headwatch::forge::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_defaults(Arc::new(reqwest::Client::new()));
//! let names: Vec<_> = registry.providers().iter().map(|p| p.name().to_string()).collect();
//! assert_eq!(names, ["github", "gitlab", "generic"]);
//!
//! assert_eq!(registry.select("https://github.com/a/b").unwrap().name(), "github");
//! assert_eq!(registry.select("https://example.com/a/b").unwrap().name(), "generic");
//! ```

use std::sync::Arc;

use log::{debug, warn};

use super::generic::GenericProvider;
use super::github::GitHubProvider;
use super::gitlab::GitLabProvider;
use super::traits::{Auth, Provider, ProviderError};
use crate::config::Config;
use crate::http::{CancelSignal, HttpTransport};

/// Reason returned when no registered provider accepts a URL.
pub const NO_PROVIDER_REASON: &str = "no provider supports repository URL";

/// Known provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// GitHub REST API
    GitHub,
    /// GitLab v4 API
    GitLab,
    /// Wildcard fallback
    Generic,
}

impl ProviderKind {
    /// All kinds in default dispatch order.
    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::GitHub,
            ProviderKind::GitLab,
            ProviderKind::Generic,
        ]
    }

    /// The provider name as used in configuration and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
            ProviderKind::Generic => "generic",
        }
    }

    /// Parse a kind from its name, case-insensitively.
    ///
    /// # Example
    ///
    /// ```
    /// use headwatch::forge::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("GitLab"), Some(ProviderKind::GitLab));
    /// assert_eq!(ProviderKind::parse("bitbucket"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ProviderKind::GitHub),
            "gitlab" => Some(ProviderKind::GitLab),
            "generic" => Some(ProviderKind::Generic),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ordered set of providers.
///
/// Immutable once built and safe to share across tasks.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry. Every lookup fails until providers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The public GitHub and GitLab providers followed by the wildcard.
    pub fn with_defaults(transport: Arc<dyn HttpTransport>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GitHubProvider::new(transport.clone())));
        registry.register(Arc::new(GitLabProvider::new(transport)));
        registry.register(Arc::new(GenericProvider::new()));
        registry
    }

    /// Build a registry from configuration.
    ///
    /// Enabled providers are registered as GitHub, GitLab, then the wildcard
    /// when `generic_fallback` is set.
    pub fn from_config(config: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        let mut registry = Self::new();

        for kind in ProviderKind::all() {
            let provider: Arc<dyn Provider> = match kind {
                ProviderKind::Generic => {
                    if !config.generic_fallback() {
                        continue;
                    }
                    Arc::new(GenericProvider::new())
                }
                ProviderKind::GitHub | ProviderKind::GitLab => {
                    let Some(settings) = config.provider(*kind) else {
                        continue;
                    };
                    if !settings.enabled {
                        debug!("provider {} disabled by configuration", kind);
                        continue;
                    }
                    if *kind == ProviderKind::GitHub {
                        Arc::new(
                            GitHubProvider::with_api_base(
                                transport.clone(),
                                settings.hosts,
                                settings.api_base,
                            )
                            .user_agent(config.user_agent()),
                        )
                    } else {
                        Arc::new(
                            GitLabProvider::with_api_base(
                                transport.clone(),
                                settings.hosts,
                                settings.api_base,
                            )
                            .user_agent(config.user_agent()),
                        )
                    }
                }
            };
            registry.register(provider);
        }

        registry
    }

    /// Add a provider.
    ///
    /// Wildcard providers go to the end. A host-specific provider goes just
    /// before the first wildcard, so it is never shadowed.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        if provider.is_wildcard() {
            self.providers.push(provider);
            return;
        }

        match self.providers.iter().position(|p| p.is_wildcard()) {
            Some(index) => {
                warn!(
                    "provider {} registered after wildcard {}; moving it ahead",
                    provider.name(),
                    self.providers[index].name()
                );
                self.providers.insert(index, provider);
            }
            None => self.providers.push(provider),
        }
    }

    /// Providers in dispatch order.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The first provider that supports `repo_url`.
    pub fn select(&self, repo_url: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.is_supported(repo_url))
            .cloned()
    }

    /// Resolve `reference` through the first provider that supports `repo_url`.
    ///
    /// The selected provider's result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Whatever the selected provider returns, or a `generic` error with
    /// reason [`NO_PROVIDER_REASON`] when nothing matches, which callers
    /// handle like the wildcard's delegation signal.
    pub async fn resolve(
        &self,
        cancel: &CancelSignal,
        repo_url: &str,
        reference: &str,
        auth: &Auth,
    ) -> Result<String, ProviderError> {
        let Some(provider) = self.select(repo_url) else {
            debug!("no provider for {}", repo_url);
            return Err(ProviderError::generic(repo_url, NO_PROVIDER_REASON));
        };

        debug!("resolving {}@{} via {}", repo_url, reference, provider.name());
        provider
            .get_latest_commit(cancel, repo_url, reference, auth)
            .await
    }
}

/// Names accepted in configuration and by [`ProviderKind::parse`].
pub fn valid_provider_names() -> Vec<&'static str> {
    ProviderKind::all().iter().map(|k| k.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::hosts::HostSet;
    use crate::forge::traits::ErrorOp;
    use crate::http::mock::MockTransport;
    use reqwest::StatusCode;

    fn names(registry: &ProviderRegistry) -> Vec<String> {
        registry
            .providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    mod provider_kind {
        use super::*;

        #[test]
        fn name_returns_lowercase() {
            assert_eq!(ProviderKind::GitHub.name(), "github");
            assert_eq!(ProviderKind::GitLab.name(), "gitlab");
            assert_eq!(ProviderKind::Generic.name(), "generic");
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(ProviderKind::parse("GITHUB"), Some(ProviderKind::GitHub));
            assert_eq!(ProviderKind::parse("gitlab"), Some(ProviderKind::GitLab));
            assert_eq!(ProviderKind::parse("Generic"), Some(ProviderKind::Generic));
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(ProviderKind::parse("bitbucket"), None);
            assert_eq!(ProviderKind::parse(""), None);
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ProviderKind::GitLab), "gitlab");
        }

        #[test]
        fn valid_names() {
            assert_eq!(valid_provider_names(), vec!["github", "gitlab", "generic"]);
        }
    }

    mod register {
        use super::*;

        #[test]
        fn defaults_order() {
            let registry = ProviderRegistry::with_defaults(Arc::new(MockTransport::hang()));
            assert_eq!(names(&registry), ["github", "gitlab", "generic"]);
        }

        #[test]
        fn host_specific_moves_ahead_of_wildcard() {
            let transport: Arc<dyn HttpTransport> = Arc::new(MockTransport::hang());
            let mut registry = ProviderRegistry::new();
            registry.register(Arc::new(GitHubProvider::new(transport.clone())));
            registry.register(Arc::new(GenericProvider::new()));
            registry.register(Arc::new(GitLabProvider::new(transport)));

            assert_eq!(names(&registry), ["github", "gitlab", "generic"]);
        }

        #[test]
        fn debug_lists_names() {
            let registry = ProviderRegistry::with_defaults(Arc::new(MockTransport::hang()));
            assert_eq!(
                format!("{:?}", registry),
                r#"["github", "gitlab", "generic"]"#
            );
        }
    }

    mod from_config {
        use super::*;

        #[test]
        fn default_config_matches_defaults() {
            let registry =
                ProviderRegistry::from_config(&Config::default(), Arc::new(MockTransport::hang()));
            assert_eq!(names(&registry), ["github", "gitlab", "generic"]);
        }

        #[test]
        fn disabled_and_no_fallback() {
            let config =
                Config::from_toml("generic_fallback = false\n[gitlab]\nenabled = false").unwrap();
            let registry = ProviderRegistry::from_config(&config, Arc::new(MockTransport::hang()));
            assert_eq!(names(&registry), ["github"]);
        }

        #[test]
        fn configured_hosts_are_used() {
            let config = Config::from_toml(
                "[gitlab]\nhosts = [\"gitlab.example.com\"]\napi_base = \"https://gitlab.example.com/api/v4\"",
            )
            .unwrap();
            let registry = ProviderRegistry::from_config(&config, Arc::new(MockTransport::hang()));

            let selected = registry.select("https://gitlab.example.com/g/p").unwrap();
            assert_eq!(selected.name(), "gitlab");
            assert_eq!(selected.hosts(), &HostSet::new(["gitlab.example.com"]));
            assert_eq!(
                registry.select("https://gitlab.com/g/p").unwrap().name(),
                "generic"
            );
        }

        #[tokio::test]
        async fn configured_user_agent_is_sent() {
            let transport = MockTransport::respond(StatusCode::OK, r#"{"sha":"abc"}"#);
            let config = Config::from_toml("user_agent = \"monitor/1.0\"").unwrap();
            let registry = ProviderRegistry::from_config(&config, Arc::new(transport.clone()));

            registry
                .resolve(&CancelSignal::new(), "https://github.com/a/b", "main", &Auth::None)
                .await
                .unwrap();
            assert_eq!(
                transport.last_request().unwrap().header("User-Agent"),
                Some("monitor/1.0")
            );
        }
    }

    mod resolve {
        use super::*;

        #[tokio::test]
        async fn routes_github() {
            let transport = MockTransport::respond(StatusCode::OK, r#"{"sha":"abc","id":"nope"}"#);
            let registry = ProviderRegistry::with_defaults(Arc::new(transport.clone()));

            let sha = registry
                .resolve(&CancelSignal::new(), "https://github.com/a/b", "main", &Auth::None)
                .await
                .unwrap();
            assert_eq!(sha, "abc");
            assert!(transport
                .last_request()
                .unwrap()
                .url
                .starts_with("https://api.github.com/"));
        }

        #[tokio::test]
        async fn routes_gitlab() {
            let transport = MockTransport::respond(StatusCode::OK, r#"{"sha":"nope","id":"def"}"#);
            let registry = ProviderRegistry::with_defaults(Arc::new(transport.clone()));

            let id = registry
                .resolve(&CancelSignal::new(), "https://gitlab.com/g/p", "main", &Auth::None)
                .await
                .unwrap();
            assert_eq!(id, "def");
        }

        #[tokio::test]
        async fn unknown_host_reaches_wildcard() {
            let transport = MockTransport::respond(StatusCode::OK, "{}");
            let registry = ProviderRegistry::with_defaults(Arc::new(transport.clone()));

            let err = registry
                .resolve(&CancelSignal::new(), "https://example.com/a/b", "main", &Auth::None)
                .await
                .unwrap_err();
            assert_eq!(err.op(), ErrorOp::Generic);
            assert_eq!(err.reason(), "generic provider delegates to go-git");
            assert_eq!(transport.request_count(), 0);
        }

        #[tokio::test]
        async fn provider_error_is_returned_verbatim() {
            let transport = MockTransport::respond(StatusCode::NOT_FOUND, "");
            let registry = ProviderRegistry::with_defaults(Arc::new(transport));

            let err = registry
                .resolve(&CancelSignal::new(), "https://github.com/a/b", "main", &Auth::None)
                .await
                .unwrap_err();
            assert_eq!(err.op(), ErrorOp::Api);
            assert_eq!(err.url(), "https://github.com/a/b");
            assert_eq!(err.reason(), "repository or reference not found");
        }

        #[tokio::test]
        async fn no_match_without_wildcard() {
            let mut registry = ProviderRegistry::new();
            registry.register(Arc::new(GitHubProvider::new(Arc::new(MockTransport::hang()))));

            let err = registry
                .resolve(&CancelSignal::new(), "https://example.com/a/b", "main", &Auth::None)
                .await
                .unwrap_err();
            assert!(err.is_generic());
            assert_eq!(err.reason(), NO_PROVIDER_REASON);
        }

        #[tokio::test]
        async fn empty_registry() {
            let registry = ProviderRegistry::new();
            assert!(registry.is_empty());
            assert!(registry.select("https://github.com/a/b").is_none());
        }
    }
}
