//! HTTP image fetcher.

use std::time::Duration;

use async_trait::async_trait;
use kitchen_core::error::DomainError;
use kitchen_core::storage::ImageFetcher;

const USER_AGENT: &str = concat!("kitchen-export/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetches image bytes server-side, so the client never needs cross-origin
/// access to the bucket.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Builds the fetcher.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be
    /// built.
    pub fn new() -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("http client: {e}")))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError> {
        tracing::debug!(%url, "fetching image");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("image request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Infrastructure(format!(
                "image fetch answered {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("image body unreadable: {e}")))?;
        Ok(bytes.to_vec())
    }
}
