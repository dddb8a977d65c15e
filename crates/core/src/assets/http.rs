//! Asset source backed by an HTTP server.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use super::error::AssetError;
use super::traits::AssetSource;

/// Fetches assets relative to a base URL.
pub struct HttpAssetSource {
    client: Client,
    base_url: String,
}

impl HttpAssetSource {
    /// Creates a source rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            relative_path.trim_start_matches("./").trim_start_matches('/')
        )
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, relative_path: &str) -> Result<Bytes, AssetError> {
        let url = self.url_for(relative_path);
        debug!(url = %url, "Fetching engine asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssetError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| AssetError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        if body.is_empty() {
            return Err(AssetError::Empty { name: url });
        }

        Ok(body)
    }
}
