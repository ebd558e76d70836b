//! config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration decides which providers are registered, which hosts each
//! one claims, and which API base URL it talks to. Without a config file the
//! defaults produce the public GitHub and GitLab providers followed by the
//! wildcard fallback.
//!
//! # Config Location
//!
//! 1. An explicit path passed to [`Config::load`] (must exist)
//! 2. `<config dir>/headwatch/config.toml` via `dirs::config_dir()`
//! 3. Built-in defaults
//!
//! The library never reads environment variables.
//!
//! # Example
//!
//! ```no_run
//! use headwatch::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("User-Agent: {}", config.user_agent());
//! println!("Fallback: {}", config.generic_fallback());
//! ```

pub mod schema;

pub use schema::{Config, ProviderConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::forge::{github, gitlab, HostSet, ProviderKind, DEFAULT_USER_AGENT};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective settings for one HTTP-backed provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Whether the provider is registered
    pub enabled: bool,
    /// Hosts routed to the provider
    pub hosts: HostSet,
    /// API base URL
    pub api_base: String,
}

impl Config {
    /// Load configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `path` is missing, or if a config file
    /// exists but cannot be read, parsed or validated. A missing default
    /// config file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::read(&path)?,
                None => Config::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("headwatch").join("config.toml"))
    }

    /// Read and parse a config file.
    fn read(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// User-Agent header value (default: `Watchtower-Git-Monitor`).
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Whether the wildcard provider is registered (default: true).
    pub fn generic_fallback(&self) -> bool {
        self.generic_fallback.unwrap_or(true)
    }

    /// Effective settings for an HTTP-backed provider.
    ///
    /// Returns `None` for [`ProviderKind::Generic`], which has no settings
    /// beyond [`generic_fallback`](Self::generic_fallback).
    pub fn provider(&self, kind: ProviderKind) -> Option<ProviderSettings> {
        let (section, default_host, default_api_base) = match kind {
            ProviderKind::GitHub => (
                self.github.as_ref(),
                github::DEFAULT_HOST,
                github::DEFAULT_API_BASE,
            ),
            ProviderKind::GitLab => (
                self.gitlab.as_ref(),
                gitlab::DEFAULT_HOST,
                gitlab::DEFAULT_API_BASE,
            ),
            ProviderKind::Generic => return None,
        };

        let section = section.cloned().unwrap_or_default();
        Some(ProviderSettings {
            enabled: section.enabled.unwrap_or(true),
            hosts: match section.hosts {
                Some(hosts) => HostSet::new(hosts),
                None => HostSet::new([default_host]),
            },
            api_base: section
                .api_base
                .unwrap_or_else(|| default_api_base.to_string()),
        })
    }
}
