//! Object storage keys, public URLs and the HTTP signer client.

use std::time::Duration;

use async_trait::async_trait;
use kitchen_core::error::DomainError;
use kitchen_core::storage::ObjectStorage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix every uploaded image key lives under.
pub const KEY_PREFIX: &str = "cooking-images";

/// Lifetime of a signed upload URL.
pub const UPLOAD_URL_TTL_SECS: u64 = 3600;

const SIGNER_TIMEOUT_SECS: u64 = 15;

/// Key prefix owned by `project_id`.
#[must_use]
pub fn project_key_prefix(project_id: Uuid) -> String {
    format!("{KEY_PREFIX}/{project_id}/")
}

/// A fresh storage key for an upload of `filename` into `project_id`. The
/// extension is taken from the client's filename.
#[must_use]
pub fn upload_key(project_id: Uuid, filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "jpg".to_owned(), str::to_ascii_lowercase);
    format!("{}{}.{ext}", project_key_prefix(project_id), Uuid::new_v4())
}

/// Joins a public base URL and a key. A base without scheme gets
/// `https://`; exactly one slash separates base and key. Without a base the
/// key itself is returned.
#[must_use]
pub fn public_url(base: Option<&str>, key: &str) -> String {
    let Some(base) = base.filter(|b| !b.is_empty()) else {
        return key.to_owned();
    };
    let mut url = if base.starts_with("http://") || base.starts_with("https://") {
        base.to_owned()
    } else {
        format!("https://{base}")
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(key.strip_prefix('/').unwrap_or(key));
    url
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    key: &'a str,
    content_type: &'a str,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    url: String,
}

/// Object storage backed by an external signing service. The service
/// receives `{ key, content_type, expires_in }` and answers `{ url }`.
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    http_client: reqwest::Client,
    signer_url: String,
    public_base: Option<String>,
}

impl HttpObjectStorage {
    /// Builds a client for `signer_url`, serving objects from
    /// `public_base`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be
    /// built.
    pub fn new(signer_url: String, public_base: Option<String>) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SIGNER_TIMEOUT_SECS))
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("http client: {e}")))?;
        Ok(Self {
            http_client,
            signer_url,
            public_base,
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn issue_upload_target(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, DomainError> {
        tracing::debug!(%key, %content_type, "requesting signed upload url");

        let response = self
            .http_client
            .post(&self.signer_url)
            .json(&SignRequest {
                key,
                content_type,
                expires_in: UPLOAD_URL_TTL_SECS,
            })
            .send()
            .await
            .map_err(|e| DomainError::Upload(format!("signer unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Upload(format!(
                "signer answered {}: {body}",
                status.as_u16()
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upload(format!("unreadable signer response: {e}")))?;
        Ok(signed.url)
    }

    fn public_url_for(&self, key: &str) -> String {
        public_url(self.public_base.as_deref(), key)
    }
}
