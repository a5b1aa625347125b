//! Certificate transparency search through the Facebook Graph API.
//!
//! Needs an app id and secret; they are exchanged for an app access token
//! on every query. Results are paginated and followed through `paging.next`.

use super::{send, Source, SourceQuery};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const GRAPH_URL: &str = "https://graph.facebook.com";

/// Upper bound on followed result pages for one domain
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CertificatesPage {
    #[serde(default)]
    data: Vec<CertificateEntry>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct CertificateEntry {
    #[serde(default)]
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

impl CertificatesPage {
    /// URL of the following page, if there is one.
    fn next_page(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// Lookup against the Graph API `certificates` edge.
#[derive(Clone)]
pub struct Facebook {
    client: Client,
    app_id: Option<String>,
    app_secret: Option<String>,
}

impl Facebook {
    pub fn new(client: Client, app_id: Option<String>, app_secret: Option<String>) -> Self {
        Self {
            client,
            app_id,
            app_secret,
        }
    }

    async fn access_token(&self, app_id: &str, app_secret: &str) -> Result<String, SourceError> {
        let request = self
            .client
            .get(format!("{}/oauth/access_token", GRAPH_URL))
            .query(&[
                ("client_id", app_id),
                ("client_secret", app_secret),
                ("grant_type", "client_credentials"),
            ]);

        let token: AccessToken = send(request).await?.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SourceQuery for Facebook {
    fn name(&self) -> &'static str {
        Source::Facebook.as_str()
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let (Some(app_id), Some(app_secret)) = (&self.app_id, &self.app_secret) else {
            return Ok(Vec::new());
        };

        let token = self.access_token(app_id, app_secret).await?;
        let wildcard = format!("*.{}", domain);
        let mut request = self
            .client
            .get(format!("{}/certificates", GRAPH_URL))
            .query(&[
                ("fields", "domains"),
                ("access_token", token.as_str()),
                ("query", wildcard.as_str()),
            ]);

        let mut names = Vec::new();
        for _ in 0..MAX_PAGES {
            let page: CertificatesPage = send(request).await?.json().await?;
            let next = page.next_page().map(str::to_string);
            names.extend(page.data.into_iter().flat_map(|entry| entry.domains));

            match next {
                Some(url) => request = self.client.get(url),
                None => break,
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_with_next_link() {
        let body = r#"{
            "data": [{"domains": ["a.example.com", "b.example.com"]}, {"domains": []}],
            "paging": {"cursors": {}, "next": "https://graph.facebook.com/v2/certificates?after=x"}
        }"#;

        let page: CertificatesPage = serde_json::from_str(body).unwrap();
        assert_eq!(
            page.next_page(),
            Some("https://graph.facebook.com/v2/certificates?after=x")
        );
        assert_eq!(page.data[0].domains.len(), 2);
    }

    #[test]
    fn test_last_page() {
        let page: CertificatesPage =
            serde_json::from_str(r#"{"data": [], "paging": {"next": ""}}"#).unwrap();
        assert_eq!(page.next_page(), None);

        let page: CertificatesPage = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(page.next_page(), None);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_silent() {
        let source = Facebook::new(Client::new(), Some("id".to_string()), None);
        assert!(source.query("example.com").await.unwrap().is_empty());
    }
}
