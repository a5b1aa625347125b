//! # Assetfinder Library
//!
//! Concurrent discovery of hostnames related to a set of domains, using
//! certificate transparency logs, passive DNS and other public lookup
//! services.
//!
//! Every domain is searched at the same time, and for each domain every
//! lookup source is queried at the same time. A shared per-source rate
//! limiter keeps each service at one call per interval, failing sources are
//! logged and skipped, and the results are cleaned and deduplicated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetfinder_lib::{DiscoveryConfig, DiscoveryEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = DiscoveryEngine::with_config(DiscoveryConfig::default().with_subs_only(true))?;
//!
//!     for host in engine.discover(&["example.com"]).await? {
//!         println!("{}", host);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Concurrent fan-out**: all domains and all sources in parallel
//! - **Per-source rate limiting**: one call per interval, shared across domains
//! - **Pluggable sources**: implement [`SourceQuery`] to add your own
//! - **Configurable**: TOML files, `AF_*` environment variables, builders

// Re-export main public API types and functions
// This makes them available as assetfinder_lib::TypeName
pub use concurrent::RateLimiter;
pub use config::{load_env_config, ConfigManager, DefaultsConfig, EnvConfig, FileConfig};
pub use engine::DiscoveryEngine;
pub use error::{AssetFinderError, SourceError};
pub use logging::LogSink;
pub use sources::{build_http_client, parse_sources, Source, SourceQuery};
pub use types::{DiscoveryConfig, HostnameStream, SourceCredentials, DEFAULT_LOG_PATH};
pub use utils::{
    clean_hostname, dedup_preserving_order, is_in_scope, parse_domain_list, parse_duration,
};
pub use worker::DomainWorker;

// Public modules
pub mod sources;

// Internal modules - these are not part of the public API
mod concurrent;
mod config;
mod engine;
mod error;
mod logging;
mod types;
mod utils;
mod worker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AssetFinderError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
