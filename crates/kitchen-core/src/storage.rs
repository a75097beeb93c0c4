//! Object storage collaborators.
//!
//! Image bytes never pass through the kitchen on upload: clients PUT them to
//! a signed URL minted by the storage provider. Export is the only place
//! bytes are read back.

use async_trait::async_trait;

use crate::error::DomainError;

/// A signed upload target handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Where the client PUTs the bytes.
    pub upload_url: String,
    /// Storage key the object will live under.
    pub key: String,
    /// Public URL the object will be served from once uploaded.
    pub public_url: String,
}

/// The object storage provider.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Mints a signed URL allowing a single PUT of `content_type` to `key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Upload` when the provider refuses or is
    /// unreachable.
    async fn issue_upload_target(&self, key: &str, content_type: &str)
    -> Result<String, DomainError>;

    /// Public URL an object under `key` is served from.
    fn public_url_for(&self, key: &str) -> String;
}

/// Retrieves image bytes for export.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Downloads the bytes at `url`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on transport failures and
    /// non-success responses.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError>;
}
