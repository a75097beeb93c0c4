//! Bundle results.

use serde::Serialize;
use uuid::Uuid;

/// Filename of the script inside a full bundle.
pub const SCRIPT_FILENAME: &str = "script.txt";

/// Folder holding the images inside a full bundle.
pub const IMAGES_FOLDER: &str = "images";

/// One image written into the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleEntry {
    /// Path inside the archive.
    pub path: String,
    /// The image it came from.
    pub image_id: Uuid,
}

/// An adopted image that could not be fetched and was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFetchFailure {
    /// The image that was skipped.
    pub image_id: Uuid,
    /// Where it was fetched from.
    pub image_url: String,
    /// Why the fetch failed.
    pub reason: String,
}

/// A built archive together with what went into it and what did not.
#[derive(Debug, Clone)]
pub struct ImageBundle {
    /// The archive bytes.
    pub archive: Vec<u8>,
    /// Images written, in archive order.
    pub entries: Vec<BundleEntry>,
    /// Images skipped because their bytes could not be fetched.
    pub failures: Vec<ImageFetchFailure>,
}

impl ImageBundle {
    /// True when at least one adopted image is missing from the archive.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
