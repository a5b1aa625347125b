//! ThreatCrowd domain report.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const REPORT_URL: &str = "https://www.threatcrowd.org/searchApi/v2/domain/report/";

#[derive(Debug, Deserialize)]
struct DomainReport {
    #[serde(default)]
    subdomains: Vec<String>,
}

/// Lookup against the ThreatCrowd domain report API.
#[derive(Clone)]
pub struct ThreatCrowd {
    client: Client,
}

impl ThreatCrowd {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for ThreatCrowd {
    fn name(&self) -> &'static str {
        Source::ThreatCrowd.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let request = self.client.get(REPORT_URL).query(&[("domain", domain)]);
        let report: DomainReport = send(request).await?.json().await?;
        Ok(report.subdomains)
    }
}
