//! Splitting a raw script into section blocks.

use std::sync::LazyLock;

use regex::Regex;

/// Sections are appended in batches of this size. Batches are a storage
/// detail; an import is still a single append.
pub const IMPORT_BATCH_SIZE: usize = 20;

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+|\r\n\r\n+").expect("blank line pattern is valid"));

/// Splits `raw` on runs of blank lines, trims every block and drops the
/// empty ones.
#[must_use]
pub fn split_script(raw: &str) -> Vec<String> {
    BLANK_LINES
        .split(raw)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_owned)
        .collect()
}
