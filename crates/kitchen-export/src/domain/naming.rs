//! Archive entry names for adopted images.
//!
//! An image is named `Section{N}_{uploader}.{ext}` where `N` is the 1-based
//! position of its section. Images whose section is gone use
//! `SectionUnknown`. Repeated names get `_2`, `_3`, ... before the
//! extension.

use std::collections::HashSet;

const DEFAULT_EXTENSION: &str = "jpg";

/// Extension of the last path segment of `url`, lowercased, or `jpg`.
#[must_use]
pub fn extension_from_url(url: &str) -> String {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_owned(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_owned(),
    };
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| DEFAULT_EXTENSION.to_owned(), str::to_ascii_lowercase)
}

/// Makes a display name safe to use as one path segment.
#[must_use]
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_owned()
    } else {
        cleaned
    }
}

/// Stem for an image of the section at `section_index` (0-based).
#[must_use]
pub fn image_stem(section_index: Option<usize>, uploader_name: &str) -> String {
    let section = section_index.map_or_else(|| "Unknown".to_owned(), |i| (i + 1).to_string());
    format!("Section{section}_{}", sanitize_segment(uploader_name))
}

/// Hands out unique file names within one archive.
#[derive(Debug, Default)]
pub struct EntryNamer {
    used: HashSet<String>,
}

impl EntryNamer {
    /// A namer with no names taken.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `{stem}.{ext}`, or the first free `{stem}_{n}.{ext}` from `n = 2`.
    pub fn unique(&mut self, stem: &str, ext: &str) -> String {
        let mut candidate = format!("{stem}.{ext}");
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{stem}_{n}.{ext}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
