//! crt.sh certificate transparency search.
//!
//! The query `%.<domain>` matches every logged certificate for a subdomain.
//! A single entry's `name_value` may hold several names separated by newlines.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SEARCH_URL: &str = "https://crt.sh/";

#[derive(Debug, Deserialize)]
struct CertificateEntry {
    #[serde(default)]
    name_value: String,
}

/// Lookup against crt.sh.
#[derive(Clone)]
pub struct CrtSh {
    client: Client,
}

impl CrtSh {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceQuery for CrtSh {
    fn name(&self) -> &'static str {
        Source::CrtSh.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let pattern = format!("%.{}", domain);
        let request = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", pattern.as_str()), ("output", "json")]);

        let entries: Vec<CertificateEntry> = send(request).await?.json().await?;
        Ok(names(entries))
    }
}

fn names(entries: Vec<CertificateEntry>) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
