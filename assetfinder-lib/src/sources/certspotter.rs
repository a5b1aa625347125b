//! CertSpotter certificate issuance search.
//!
//! Every issued certificate covering the domain or one of its subdomains
//! contributes all of its DNS names.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const ISSUANCES_URL: &str = "https://api.certspotter.com/v1/issuances";

#[derive(Debug, Deserialize)]
struct Issuance {
    #[serde(default)]
    dns_names: Vec<String>,
}

/// Lookup against the CertSpotter issuances API.
#[derive(Clone)]
pub struct CertSpotter {
    client: Client,
}

impl CertSpotter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for CertSpotter {
    fn name(&self) -> &'static str {
        Source::CertSpotter.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let request = self.client.get(ISSUANCES_URL).query(&[
            ("domain", domain),
            ("include_subdomains", "true"),
            ("expand", "dns_names"),
        ]);

        let issuances: Vec<Issuance> = send(request).await?.json().await?;
        Ok(dns_names(issuances))
    }
}

fn dns_names(issuances: Vec<Issuance>) -> Vec<String> {
    issuances
        .into_iter()
        .flat_map(|issuance| issuance.dns_names)
        .collect()
}
