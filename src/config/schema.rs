//! config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: hosts must be bare hostnames
//! (optionally with a port), API base URLs must be absolute http(s) URLs,
//! and the User-Agent must be non-empty.

use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Top-level configuration.
///
/// Every field is optional; accessors on this type apply the defaults.
///
/// # Example
///
/// ```toml
/// user_agent = "Watchtower-Git-Monitor"
/// generic_fallback = true
///
/// [github]
/// hosts = ["github.com"]
///
/// [gitlab]
/// hosts = ["gitlab.com", "gitlab.example.com"]
/// api_base = "https://gitlab.example.com/api/v4"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// User-Agent sent with every API request
    pub user_agent: Option<String>,

    /// Register the wildcard provider after the host-specific ones
    pub generic_fallback: Option<bool>,

    /// GitHub provider settings
    pub github: Option<ProviderConfig>,

    /// GitLab provider settings
    pub gitlab: Option<ProviderConfig>,
}

impl Config {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "user_agent cannot be empty".to_string(),
                ));
            }
            if HeaderValue::from_str(agent).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "user_agent '{}' is not a valid header value",
                    agent.escape_debug()
                )));
            }
        }

        if let Some(github) = &self.github {
            github.validate("github")?;
        }
        if let Some(gitlab) = &self.gitlab {
            gitlab.validate("gitlab")?;
        }

        Ok(())
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Register this provider at all
    pub enabled: Option<bool>,

    /// Hosts routed to this provider (replaces the default host)
    pub hosts: Option<Vec<String>>,

    /// API base URL, for explicitly configured self-hosted instances
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Validate the settings of the provider called `name`.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if let Some(hosts) = &self.hosts {
            for host in hosts {
                validate_host(host).map_err(|reason| {
                    ConfigError::InvalidValue(format!(
                        "invalid {} host '{}': {}",
                        name, host, reason
                    ))
                })?;
            }
        }

        if let Some(api_base) = &self.api_base {
            validate_api_base(api_base).map_err(|reason| {
                ConfigError::InvalidValue(format!(
                    "invalid {} api_base '{}': {}",
                    name, api_base, reason
                ))
            })?;
        }

        Ok(())
    }
}

fn validate_host(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("host cannot be empty");
    }
    if host.contains('/') || host.contains("://") {
        return Err("expected a bare hostname, not a URL");
    }
    if host.chars().any(char::is_whitespace) {
        return Err("host cannot contain whitespace");
    }
    Ok(())
}

fn validate_api_base(api_base: &str) -> Result<(), &'static str> {
    let url = Url::parse(api_base).map_err(|_| "not a valid URL")?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err("scheme must be http or https"),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host");
    }
    Ok(())
}
