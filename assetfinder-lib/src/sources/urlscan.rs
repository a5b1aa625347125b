//! urlscan.io search.
//!
//! Search results describe scans; the hostnames are taken from the scanned
//! URL and from the URL the page finally landed on.

use super::{host_of, send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SEARCH_URL: &str = "https://urlscan.io/api/v1/search/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ScanResult>,
}

#[derive(Debug, Deserialize)]
struct ScanResult {
    #[serde(default)]
    task: ScanUrl,
    #[serde(default)]
    page: ScanUrl,
}

#[derive(Debug, Default, Deserialize)]
struct ScanUrl {
    #[serde(default)]
    url: String,
}

/// Lookup against the urlscan.io search API.
#[derive(Clone)]
pub struct Urlscan {
    client: Client,
}

impl Urlscan {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for Urlscan {
    fn name(&self) -> &'static str {
        Source::Urlscan.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let search = format!("domain:{}", domain);
        let request = self.client.get(SEARCH_URL).query(&[("q", search.as_str())]);

        let response: SearchResponse = send(request).await?.json().await?;
        Ok(scanned_hosts(response))
    }
}

fn scanned_hosts(response: SearchResponse) -> Vec<String> {
    response
        .results
        .iter()
        .flat_map(|result| [&result.task.url, &result.page.url])
        .filter_map(|url| host_of(url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanned_hosts() {
        let body = r#"{
            "results": [
                {"task": {"url": "https://example.com/"}, "page": {"url": "https://www.example.com/home"}},
                {"task": {"url": "http://shop.example.com"}, "page": {}},
                {"task": {"url": "garbage"}}
            ],
            "total": 3
        }"#;

        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            scanned_hosts(response),
            vec!["example.com", "www.example.com", "shop.example.com"]
        );
    }
}
