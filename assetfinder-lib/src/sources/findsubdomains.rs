//! Subdomain listing from the Spyse API (formerly findsubdomains.com).

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SUBDOMAINS_URL: &str = "https://api.spyse.com/v1/subdomains";

#[derive(Debug, Deserialize)]
struct SubdomainsResponse {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    domain: String,
}

/// Lookup against the Spyse subdomains API. Requires an API token.
#[derive(Clone)]
pub struct FindSubDomains {
    client: Client,
    api_token: Option<String>,
}

impl FindSubDomains {
    pub fn new(client: Client, api_token: Option<String>) -> Self {
        Self { client, api_token }
    }
}

#[async_trait]
impl SourceQuery for FindSubDomains {
    fn name(&self) -> &'static str {
        Source::FindSubDomains.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let Some(api_token) = &self.api_token else {
            return Ok(Vec::new());
        };

        let request = self
            .client
            .get(SUBDOMAINS_URL)
            .query(&[("domain", domain), ("api_token", api_token.as_str())]);

        let response: SubdomainsResponse = send(request).await?.json().await?;
        Ok(record_domains(response))
    }
}

fn record_domains(response: SubdomainsResponse) -> Vec<String> {
    response
        .records
        .into_iter()
        .map(|record| record.domain)
        .filter(|domain| !domain.is_empty())
        .collect()
}
