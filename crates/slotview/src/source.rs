//! Pull boundary: paginated entry pages, node status, and single-entry detail.
//!
//! [HttpSource] talks to the explorer backend over HTTP. Tests and alternative transports
//! implement [LedgerSource] directly.

use crate::config::ExplorerConfig;
use crate::entry::{Entry, Node};
use serde::de::DeserializeOwned;
use std::future::Future;
use thiserror::Error;
use tokio::time::Duration;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
}

/// One pulled page. `limit` is what was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub limit: usize,
}

impl Page {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A full page means the remote may hold more entries past it.
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.limit
    }
}

/// Source of pulled ledger data.
pub trait LedgerSource: Send + Sync + 'static {
    fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page, SourceError>> + Send;

    fn fetch_nodes(&self) -> impl Future<Output = Result<Vec<Node>, SourceError>> + Send;

    /// `Ok(None)` when the backend does not know the hash.
    fn fetch_entry_detail(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<Option<Entry>, SourceError>> + Send;
}

/// Explorer backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ExplorerConfig) -> Result<Self, SourceError> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// GET `url` and decode the JSON body. 404 maps to `Ok(None)`.
async fn http_get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<Option<T>, SourceError> {
    let resp = client.get(url).query(query).send().await?;
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    let value = serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
    Ok(Some(value))
}

impl LedgerSource for HttpSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Page, SourceError> {
        let query = [("offset", offset.to_string()), ("limit", limit.to_string())];
        let entries: Vec<Entry> = http_get_json(&self.client, &self.url("/blocks"), &query)
            .await?
            .ok_or(SourceError::Status(404))?;
        Ok(Page { entries, limit })
    }

    async fn fetch_nodes(&self) -> Result<Vec<Node>, SourceError> {
        http_get_json(&self.client, &self.url("/nodes"), &[])
            .await?
            .ok_or(SourceError::Status(404))
    }

    async fn fetch_entry_detail(&self, hash: &str) -> Result<Option<Entry>, SourceError> {
        http_get_json(&self.client, &self.url(&format!("/block/{}", hash)), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_fullness() {
        let page = Page {
            entries: Vec::new(),
            limit: 20,
        };
        assert!(page.is_empty());
        assert!(!page.is_full());
        let page = Page {
            entries: Vec::new(),
            limit: 0,
        };
        assert!(page.is_full());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let s = HttpSource::new("http://localhost:3001/", Duration::from_secs(1)).unwrap();
        assert_eq!(s.url("/nodes"), "http://localhost:3001/nodes");
    }
}
