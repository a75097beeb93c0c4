//! Stub storage collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use kitchen_core::error::DomainError;
use kitchen_core::storage::{ImageFetcher, ObjectStorage};

/// Public base URL used by [`StubObjectStorage`].
pub const STUB_PUBLIC_BASE: &str = "https://images.test";

/// Object storage that signs every request, or refuses every request when
/// built with [`StubObjectStorage::failing`].
#[derive(Debug, Default)]
pub struct StubObjectStorage {
    fail: bool,
    issued: Mutex<Vec<(String, String)>>,
}

impl StubObjectStorage {
    /// A provider that always signs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that always refuses.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// `(key, content_type)` pairs signed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn issued(&self) -> Vec<(String, String)> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for StubObjectStorage {
    async fn issue_upload_target(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, DomainError> {
        if self.fail {
            return Err(DomainError::Upload("signer unavailable".into()));
        }
        self.issued
            .lock()
            .unwrap()
            .push((key.to_owned(), content_type.to_owned()));
        Ok(format!("https://upload.test/{key}?signature=stub"))
    }

    fn public_url_for(&self, key: &str) -> String {
        format!("{STUB_PUBLIC_BASE}/{key}")
    }
}

/// Serves fixed bytes per URL. URLs marked as failing, and URLs it has no
/// bytes for, return an infrastructure error.
#[derive(Debug, Default)]
pub struct StubImageFetcher {
    images: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl StubImageFetcher {
    /// An empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` at `url`.
    #[must_use]
    pub fn with_image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_owned(), bytes.to_vec());
        self
    }

    /// Fails every fetch of `url`.
    #[must_use]
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failing.insert(url.to_owned());
        self
    }
}

#[async_trait]
impl ImageFetcher for StubImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError> {
        if self.failing.contains(url) {
            return Err(DomainError::Infrastructure(format!("fetch failed: {url}")));
        }
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::Infrastructure(format!("no image at {url}")))
    }
}
