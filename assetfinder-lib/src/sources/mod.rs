//! Lookup sources for hostname discovery.
//!
//! Each source asks one third-party service which hostnames it knows for a
//! domain. Sources share a single HTTP client and report raw, uncleaned
//! names; cleaning and scope filtering happen in the discovery worker.

use crate::error::{AssetFinderError, SourceError};
use crate::types::SourceCredentials;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Certificate issuance search on api.certspotter.com
pub mod certspotter;

/// Certificate transparency search on crt.sh
pub mod crtsh;

/// Certificate transparency search through the Facebook Graph API
pub mod facebook;

/// Subdomain listing from the Spyse API
pub mod findsubdomains;

/// Passive DNS from bufferover.run
pub mod bufferoverrun;

/// Host search on hackertarget.com
pub mod hackertarget;

/// Domain reports on threatcrowd.org
pub mod threatcrowd;

/// Scan search on urlscan.io
pub mod urlscan;

/// Domain reports from the VirusTotal v2 API
pub mod virustotal;

/// Archived URLs from the Wayback Machine CDX API
pub mod wayback;

/// A lookup service that maps a domain to the hostnames it knows about.
///
/// Implementations must be cheap to share between tasks; the engine calls
/// `query` once per domain, concurrently across domains.
#[async_trait]
pub trait SourceQuery: Send + Sync {
    /// Stable identity of the source, used as its rate-limit key.
    fn name(&self) -> &'static str;

    /// Look up hostnames for `domain`.
    ///
    /// An empty list is a valid answer. Returned names may be messy
    /// (wildcards, mixed case, leading dots).
    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError>;
}

/// The built-in lookup sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    CertSpotter,
    HackerTarget,
    ThreatCrowd,
    CrtSh,
    Facebook,
    VirusTotal,
    FindSubDomains,
    Urlscan,
    BufferOverrun,
    Wayback,
}

impl Source {
    /// Every built-in source, in registration order.
    pub fn all() -> Vec<Source> {
        vec![
            Source::CertSpotter,
            Source::HackerTarget,
            Source::ThreatCrowd,
            Source::CrtSh,
            Source::Facebook,
            Source::VirusTotal,
            Source::FindSubDomains,
            Source::Urlscan,
            Source::BufferOverrun,
            Source::Wayback,
        ]
    }

    /// Sources queried when nothing else is configured.
    ///
    /// Wayback is left out: it is slow enough to dominate every run.
    pub fn defaults() -> Vec<Source> {
        Self::all()
            .into_iter()
            .filter(|s| *s != Source::Wayback)
            .collect()
    }

    /// Lowercase name used in configs, on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::CertSpotter => "certspotter",
            Source::HackerTarget => "hackertarget",
            Source::ThreatCrowd => "threatcrowd",
            Source::CrtSh => "crtsh",
            Source::Facebook => "facebook",
            Source::VirusTotal => "virustotal",
            Source::FindSubDomains => "findsubdomains",
            Source::Urlscan => "urlscan",
            Source::BufferOverrun => "bufferoverrun",
            Source::Wayback => "wayback",
        }
    }

    /// Whether the source needs credentials to report anything.
    pub fn requires_credentials(&self) -> bool {
        matches!(
            self,
            Source::Facebook | Source::VirusTotal | Source::FindSubDomains
        )
    }

    /// Instantiate the source on top of a shared client.
    pub fn build(self, client: &Client, credentials: &SourceCredentials) -> Arc<dyn SourceQuery> {
        let client = client.clone();
        match self {
            Source::CertSpotter => Arc::new(certspotter::CertSpotter::new(client)),
            Source::HackerTarget => Arc::new(hackertarget::HackerTarget::new(client)),
            Source::ThreatCrowd => Arc::new(threatcrowd::ThreatCrowd::new(client)),
            Source::CrtSh => Arc::new(crtsh::CrtSh::new(client)),
            Source::Facebook => Arc::new(facebook::Facebook::new(
                client,
                credentials.facebook_app_id.clone(),
                credentials.facebook_app_secret.clone(),
            )),
            Source::VirusTotal => Arc::new(virustotal::VirusTotal::new(
                client,
                credentials.virustotal_api_key.clone(),
            )),
            Source::FindSubDomains => Arc::new(findsubdomains::FindSubDomains::new(
                client,
                credentials.spyse_api_token.clone(),
            )),
            Source::Urlscan => Arc::new(urlscan::Urlscan::new(client)),
            Source::BufferOverrun => Arc::new(bufferoverrun::BufferOverrun::new(client)),
            Source::Wayback => Arc::new(wayback::Wayback::new(client)),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AssetFinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Source::all()
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| AssetFinderError::invalid_source(s.trim()))
    }
}

/// Parse a list of source names, rejecting unknown ones.
pub fn parse_sources<S: AsRef<str>>(names: &[S]) -> Result<Vec<Source>, AssetFinderError> {
    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let source = name.as_ref().parse::<Source>()?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}

/// Build the HTTP client shared by every built-in source.
pub fn build_http_client(timeout: Duration) -> Result<Client, AssetFinderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("assetfinder/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            AssetFinderError::setup("http client", format!("Failed to create HTTP client: {}", e))
        })
}

/// Send a request and reject non-success statuses.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::status(status.as_u16()));
    }
    Ok(response)
}

/// Hostname part of a URL, if it parses and has one.
pub(crate) fn host_of(raw_url: &str) -> Option<String> {
    Url::parse(raw_url.trim())
        .ok()?
        .host_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_round_trip() {
        for source in Source::all() {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
    }

    #[test]
    fn test_source_parse_is_case_insensitive() {
        assert_eq!("CrtSh".parse::<Source>().unwrap(), Source::CrtSh);
        assert_eq!(" urlscan ".parse::<Source>().unwrap(), Source::Urlscan);
        assert!("shodan".parse::<Source>().is_err());
    }

    #[test]
    fn test_defaults_exclude_wayback() {
        let defaults = Source::defaults();
        assert_eq!(defaults.len(), 9);
        assert!(!defaults.contains(&Source::Wayback));
    }

    #[test]
    fn test_parse_sources_dedups_and_rejects_unknown() {
        let parsed = parse_sources(&["crtsh", "urlscan", "CRTSH"]).unwrap();
        assert_eq!(parsed, vec![Source::CrtSh, Source::Urlscan]);

        let err = parse_sources(&["crtsh", "nope"]).unwrap_err();
        assert!(matches!(err, AssetFinderError::InvalidSource { name } if name == "nope"));
    }

    #[test]
    fn test_built_sources_report_their_names() {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let credentials = SourceCredentials::default();
        for source in Source::all() {
            assert_eq!(source.build(&client, &credentials).name(), source.as_str());
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://Dev.Example.com:8443/login?x=1"),
            Some("dev.example.com".to_string())
        );
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("mailto:someone@example.com"), None);
    }
}
