//! Headwatch - resolve git refs to commit hashes through hosting provider APIs
//!
//! Headwatch answers "which commit does this branch or tag point at right
//! now?" for repositories on known hosts with a single REST call, so a
//! repository monitor does not need to clone. When no API path applies the
//! lookup declines with a `generic` error and the caller falls back to a
//! full-clone Git client.
//!
//! # Architecture
//!
//! - [`forge`] - Provider trait, GitHub/GitLab/wildcard providers, registry
//! - [`http`] - Transport seam consumed by providers, cancellation
//! - [`config`] - TOML configuration for hosts and API base URLs
//! - [`cli`] - Command-line interface layer
//!
//! # Invariants
//!
//! 1. Each lookup makes at most one HTTP request
//! 2. Errors carry the caller's repository URL, never credentials
//! 3. Providers and the registry hold no per-call state

pub mod cli;
pub mod config;
pub mod forge;
pub mod http;
