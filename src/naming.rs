//! Centralized filename parsing for the `N.mdx` slide convention.
//!
//! Every slide file in a deck is named by a bare number (`1.mdx`, `12.mdx`).
//! The number only feeds the numbering policy for new files: logical slide
//! order lives in file *content*, so numbers need not be contiguous or match
//! deck position.
//!
//! Import paths follow the host's convention: forward slashes, relative to the
//! project root, with a leading `./` (`./stories/slides/3.mdx`).

/// Parse the slide number from an import path like `./stories/slides/12.mdx`.
///
/// - `"./stories/slides/12.mdx"` → `Some(12)`
/// - `"stories/slides/3.mdx"` → `Some(3)`
/// - `"./stories/slides/intro.mdx"` → `None`
/// - `"./stories/slides/3.md"` with extension `mdx` → `None`
pub fn parse_slide_number(import_path: &str, extension: &str) -> Option<u32> {
    let file_name = import_path.rsplit('/').next()?;
    let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Next unused slide number: one more than the largest number seen, or 1.
///
/// `Err(max)` when the largest number seen is already `u32::MAX`.
pub fn next_slide_number(numbers: impl IntoIterator<Item = u32>) -> Result<u32, u32> {
    let max = numbers.into_iter().max().unwrap_or(0);
    max.checked_add(1).ok_or(max)
}

/// Build the import path of slide `number` inside `slides_dir`.
pub fn slide_import_path(slides_dir: &str, number: u32, extension: &str) -> String {
    let dir = normalize_import_path(slides_dir);
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{number}.{extension}")
}

/// Normalize a relative path to import-path form: forward slashes, `./` prefix.
pub fn normalize_import_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    format!("./{trimmed}")
}
