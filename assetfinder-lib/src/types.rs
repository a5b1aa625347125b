//! Core data types for hostname discovery.
//!
//! This module defines the configuration of a discovery run, the API
//! credentials some sources need, and the stream type discovery results
//! flow through.

use crate::sources::Source;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

/// A stream of cleaned hostnames.
///
/// Order follows completion order and is not meaningful.
pub type HostnameStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Default location of the discovery log file.
pub const DEFAULT_LOG_PATH: &str = "logs/assetfinder.log";

/// API credentials for the sources that need them.
///
/// A keyed source without its credentials is silent: it reports no
/// hostnames and makes no request.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceCredentials {
    /// VirusTotal API key (`VT_API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virustotal_api_key: Option<String>,

    /// Facebook app id for the certificate transparency API (`FB_APP_ID`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_app_id: Option<String>,

    /// Facebook app secret (`FB_APP_SECRET`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_app_secret: Option<String>,

    /// Spyse API token used by findsubdomains (`SPYSE_API_TOKEN`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spyse_api_token: Option<String>,
}

impl SourceCredentials {
    /// Read credentials from the conventional environment variables.
    ///
    /// Unset or empty variables leave the field as `None`.
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            virustotal_api_key: read("VT_API_KEY"),
            facebook_app_id: read("FB_APP_ID"),
            facebook_app_secret: read("FB_APP_SECRET"),
            spyse_api_token: read("SPYSE_API_TOKEN"),
        }
    }

    /// Fill every unset field from `other`.
    pub fn or(self, other: SourceCredentials) -> Self {
        Self {
            virustotal_api_key: self.virustotal_api_key.or(other.virustotal_api_key),
            facebook_app_id: self.facebook_app_id.or(other.facebook_app_id),
            facebook_app_secret: self.facebook_app_secret.or(other.facebook_app_secret),
            spyse_api_token: self.spyse_api_token.or(other.spyse_api_token),
        }
    }
}

impl fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");

        f.debug_struct("SourceCredentials")
            .field("virustotal_api_key", &redact(&self.virustotal_api_key))
            .field("facebook_app_id", &redact(&self.facebook_app_id))
            .field("facebook_app_secret", &redact(&self.facebook_app_secret))
            .field("spyse_api_token", &redact(&self.spyse_api_token))
            .finish()
    }
}

/// Configuration options for a discovery run.
///
/// Everything beyond `subs_only` has a default matching the classic
/// behaviour: one call per second per source, no deadline and no cap on
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Keep only hostnames equal to, or subdomains of, the target domain
    /// Default: false
    pub subs_only: bool,

    /// Minimum spacing between two calls to the same source
    /// Default: 1 second
    pub rate_limit_interval: Duration,

    /// Deadline for each individual source call
    /// Default: None (wait as long as the source takes)
    pub source_timeout: Option<Duration>,

    /// Maximum number of source calls in flight at once
    /// Default: None (unbounded), Range: 1-100
    pub max_in_flight: Option<usize>,

    /// When set, log records of a run go to this file instead of the
    /// subscriber installed by the host application
    pub log_file: Option<PathBuf>,

    /// Built-in sources to query
    /// Default: every source except wayback
    pub sources: Vec<Source>,

    /// Transport-level timeout of the shared HTTP client
    /// Default: 30 seconds
    pub http_timeout: Duration,

    /// Credentials for keyed sources
    /// Default: read from the environment
    pub credentials: SourceCredentials,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            subs_only: false,
            rate_limit_interval: Duration::from_secs(1),
            source_timeout: None,
            max_in_flight: None,
            log_file: None,
            sources: Source::defaults(),
            http_timeout: Duration::from_secs(30),
            credentials: SourceCredentials::from_env(),
        }
    }
}

impl DiscoveryConfig {
    /// Enable or disable the subdomain scope filter.
    pub fn with_subs_only(mut self, subs_only: bool) -> Self {
        self.subs_only = subs_only;
        self
    }

    /// Set the per-source rate limit interval.
    pub fn with_rate_limit(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Set a deadline for each source call.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }

    /// Cap the number of concurrent source calls.
    ///
    /// Automatically clamps to 1-100 to prevent resource exhaustion.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight.clamp(1, 100));
        self
    }

    /// Send log records of each run to a file.
    pub fn with_log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Replace the list of built-in sources to query.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Set the transport timeout of the HTTP client.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Replace the source credentials.
    pub fn with_credentials(mut self, credentials: SourceCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}
