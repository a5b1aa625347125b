//! VirusTotal v2 domain report.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const REPORT_URL: &str = "https://www.virustotal.com/vtapi/v2/domain/report";

#[derive(Debug, Deserialize)]
struct DomainReport {
    #[serde(default)]
    subdomains: Vec<String>,
}

/// Lookup against the VirusTotal domain report API. Requires an API key.
#[derive(Clone)]
pub struct VirusTotal {
    client: Client,
    api_key: Option<String>,
}

impl VirusTotal {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SourceQuery for VirusTotal {
    fn name(&self) -> &'static str {
        Source::VirusTotal.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let Some(api_key) = &self.api_key else {
            return Ok(Vec::new());
        };

        let request = self
            .client
            .get(REPORT_URL)
            .query(&[("domain", domain), ("apikey", api_key.as_str())]);

        let report: DomainReport = send(request).await?.json().await?;
        Ok(report.subdomains)
    }
}
