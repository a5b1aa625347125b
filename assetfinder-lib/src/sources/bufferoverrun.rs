//! Passive DNS from dns.bufferover.run.
//!
//! Records come as `ip,hostname` strings in the forward (`FDNS_A`) and
//! reverse (`RDNS`) lists; either list may be null.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DNS_URL: &str = "https://dns.bufferover.run/dns";

#[derive(Debug, Deserialize)]
struct DnsResponse {
    #[serde(rename = "FDNS_A", default)]
    forward: Option<Vec<String>>,
    #[serde(rename = "RDNS", default)]
    reverse: Option<Vec<String>>,
}

/// Lookup against the bufferover.run DNS dataset.
#[derive(Clone)]
pub struct BufferOverrun {
    client: Client,
}

impl BufferOverrun {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for BufferOverrun {
    fn name(&self) -> &'static str {
        Source::BufferOverrun.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let suffix = format!(".{}", domain);
        let request = self.client.get(DNS_URL).query(&[("q", suffix.as_str())]);

        let response: DnsResponse = send(request).await?.json().await?;
        Ok(record_hosts(response))
    }
}

fn record_hosts(response: DnsResponse) -> Vec<String> {
    response
        .forward
        .into_iter()
        .chain(response.reverse)
        .flatten()
        .filter_map(|record| {
            record
                .split_once(',')
                .map(|(_, host)| host.trim().to_string())
        })
        .filter(|host| !host.is_empty())
        .collect()
}
