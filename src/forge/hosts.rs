//! forge::hosts
//!
//! Exact host matching for repository URLs.
//!
//! A provider claims a fixed set of hostnames. A URL belongs to the provider
//! when it parses and its lowercased host is a member of that set. There is
//! no suffix or subdomain logic, so `api.github.com` does not match
//! `github.com`, and an explicit port is part of the host
//! (`github.com:8443` does not match `github.com`).

use std::collections::BTreeSet;

use url::Url;

/// A set of lowercased hostnames claimed by one provider.
///
/// # Example
///
/// ```
/// use headwatch::forge::HostSet;
///
/// let hosts = HostSet::new(["GitHub.com"]);
/// assert!(hosts.matches("https://github.com/octocat/Hello-World"));
/// assert!(hosts.matches("HTTPS://GitHub.COM/a/b"));
/// assert!(!hosts.matches("https://api.github.com/a/b"));
/// assert!(!hosts.matches("not a url"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSet {
    hosts: BTreeSet<String>,
}

impl HostSet {
    /// Build a set from hostnames. Names are lowercased; empty names are dropped.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// The empty set. Matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Whether `host` (already extracted from a URL) is in the set.
    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_lowercase())
    }

    /// Hostnames in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Whether `url` parses and its host is in the set.
    pub fn matches(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => self.hosts.contains(&host),
            None => false,
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for HostSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl std::fmt::Display for HostSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.iter().collect::<Vec<_>>().join(", ");
        write!(f, "{}", joined)
    }
}

/// Extract the lowercased `host[:port]` of `url`.
///
/// The port is taken as written, so `https://github.com:443/` yields
/// `github.com:443` even though 443 is the scheme default. Returns `None`
/// when the URL does not parse or has an empty host.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return None;
    }

    // `Url` drops default ports, so read the authority from the input.
    let (_, rest) = url.trim().split_once("://")?;
    let end = rest.find(|c: char| matches!(c, '/' | '?' | '#' | '\\')).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host = match authority.rsplit_once('@') {
        Some((_, host)) => host,
        None => authority,
    };

    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}
