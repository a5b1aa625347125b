//! Wayback Machine CDX index.
//!
//! Lists every archived URL under the domain and keeps the URL hosts. This
//! is the slowest source by far, so it is not part of the default set.

use super::{host_of, send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;

const CDX_URL: &str = "http://web.archive.org/cdx/search/cdx";

/// Lookup against the Wayback Machine CDX API.
#[derive(Clone)]
pub struct Wayback {
    client: Client,
}

impl Wayback {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for Wayback {
    fn name(&self) -> &'static str {
        Source::Wayback.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let pattern = format!("*.{}/*", domain);
        let request = self.client.get(CDX_URL).query(&[
            ("url", pattern.as_str()),
            ("output", "json"),
            ("fl", "original"),
            ("collapse", "urlkey"),
        ]);

        let rows: Vec<Vec<String>> = send(request).await?.json().await?;
        Ok(archived_hosts(rows))
    }
}

/// The first row is the column header.
fn archived_hosts(rows: Vec<Vec<String>>) -> Vec<String> {
    rows.iter()
        .skip(1)
        .filter_map(|row| row.first())
        .filter_map(|url| host_of(url))
        .collect()
}
