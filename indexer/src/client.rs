use std::time::Duration;

use alloy::primitives::Address;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{
    error::{IndexerError, SerializableReqwestError},
    types::{TicksBalance, TicksPage},
};

/// Read-only client for the inscription indexer.
#[derive(Clone, Debug)]
pub struct InscriptionIndexer {
    pub url: Url,
    pub client: reqwest::Client,
}

pub struct InscriptionIndexerBuilder {
    pub url: Url,
    pub timeout: Duration,
}

impl InscriptionIndexerBuilder {
    pub fn new(url: &str) -> Result<Self, IndexerError> {
        // Joining relative paths onto a base without a trailing slash drops its last segment.
        let normalized = if url.ends_with('/') {
            url.to_owned()
        } else {
            format!("{url}/")
        };

        Ok(Self {
            url: Url::parse(&normalized).map_err(|e| IndexerError::url(url.to_owned(), e))?,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<InscriptionIndexer, IndexerError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(IndexerError::http_client_backend)?;

        Ok(InscriptionIndexer {
            url: self.url,
            client,
        })
    }
}

impl InscriptionIndexer {
    /// All tick balances held by `address`.
    pub async fn balance(&self, address: Address) -> Result<TicksBalance, IndexerError> {
        let path = format!("balance/{}", address.to_checksum(None));
        let url = self
            .url
            .join(&path)
            .map_err(|e| IndexerError::url(path.clone(), e))?;

        tracing::debug!(%address, "Fetching inscription balance");
        self.get_json(url).await
    }

    /// One page of the tick listing.
    pub async fn ticks(&self, page: u32, size: u32) -> Result<TicksPage, IndexerError> {
        let mut url = self
            .url
            .join("v2/inscriptions")
            .map_err(|e| IndexerError::url("v2/inscriptions".to_string(), e))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        tracing::debug!(page, size, "Fetching tick listing");
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, IndexerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!("Indexer request failed: {}", e);
                SerializableReqwestError::from(e)
            })?;

        Ok(response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to decode indexer response: {}", e);
            SerializableReqwestError::from(e)
        })?)
    }
}
