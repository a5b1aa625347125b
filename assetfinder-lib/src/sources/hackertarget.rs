//! HackerTarget host search.
//!
//! The API answers in plain text, one `hostname,ip` pair per line. Error
//! messages (quota exceeded and the like) come back as lines without a comma.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;

const HOSTSEARCH_URL: &str = "https://api.hackertarget.com/hostsearch/";

/// Lookup against the HackerTarget hostsearch API.
#[derive(Clone)]
pub struct HackerTarget {
    client: Client,
}

impl HackerTarget {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for HackerTarget {
    fn name(&self) -> &'static str {
        Source::HackerTarget.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let request = self.client.get(HOSTSEARCH_URL).query(&[("q", domain)]);
        let body = send(request).await?.text().await?;
        Ok(hostnames(&body))
    }
}

fn hostnames(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.split_once(','))
        .map(|(host, _)| host.trim().to_string())
        .collect()
}
