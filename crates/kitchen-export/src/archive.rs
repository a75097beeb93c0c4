//! Archive writing.

use std::io::{Cursor, Write};

use kitchen_core::error::DomainError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A file to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated.
    pub path: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Packs (path, bytes) pairs into one downloadable archive.
pub trait ArchiveWriter: Send + Sync {
    /// Builds the archive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the archive cannot be
    /// written.
    fn write_archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, DomainError>;

    /// MIME type of the produced archive.
    fn content_type(&self) -> &'static str;
}

/// Deflate-compressed zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveWriter;

impl ArchiveWriter for ZipArchiveWriter {
    fn write_archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, DomainError> {
        let zip_error = |e: zip::result::ZipError| DomainError::Infrastructure(format!("zip: {e}"));

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in entries {
            writer
                .start_file(entry.path.as_str(), options)
                .map_err(zip_error)?;
            writer
                .write_all(&entry.bytes)
                .map_err(|e| DomainError::Infrastructure(format!("zip: {e}")))?;
        }
        Ok(writer.finish().map_err(zip_error)?.into_inner())
    }

    fn content_type(&self) -> &'static str {
        "application/zip"
    }
}
