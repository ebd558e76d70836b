//! forge
//!
//! Resolution of git refs through hosting provider APIs (GitHub, GitLab, etc.).
//!
//! # Architecture
//!
//! The `Provider` trait defines what a hosting service adapter offers:
//! host matching and a single `get_latest_commit` lookup. Callers go
//! through [`ProviderRegistry`] rather than importing specific providers.
//!
//! - Provider lookups never clone or fetch repositories
//! - A provider may decline (the wildcard always does); the caller then
//!   falls back to a full-clone Git client
//! - Errors carry the caller's repository URL, never credentials
//!
//! # Modules
//!
//! - `traits`: Core `Provider` trait, `Auth` and `ProviderError`
//! - `hosts`: Exact host matching
//! - [`github`]: GitHub REST commits endpoint
//! - [`gitlab`]: GitLab v4 repository commits endpoint
//! - `generic`: Wildcard provider signalling a full-clone fallback
//! - `registry`: Ordered dispatch
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use headwatch::forge::{Auth, ProviderRegistry};
//! use headwatch::http::CancelSignal;
//!
//! let registry = ProviderRegistry::with_defaults(Arc::new(reqwest::Client::new()));
//!
//! match registry
//!     .resolve(&CancelSignal::new(), "https://github.com/octocat/Hello-World", "master", &Auth::None)
//!     .await
//! {
//!     Ok(sha) => println!("{}", sha),
//!     Err(e) if e.is_generic() => { /* clone and resolve locally */ }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod generic;
pub mod github;
pub mod gitlab;
mod hosts;
mod registry;
mod request;
mod traits;

pub use generic::{GenericProvider, DELEGATE_REASON};
pub use hosts::{host_of, HostSet};
pub use registry::{valid_provider_names, ProviderKind, ProviderRegistry, NO_PROVIDER_REASON};
pub use request::DEFAULT_USER_AGENT;
pub use traits::*;
