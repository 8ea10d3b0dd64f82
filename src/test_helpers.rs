//! Shared test utilities for the slideset test suite.
//!
//! Provides fixture setup, a fixed index source, and bulk extractors for
//! asserting on whole decks at once.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let store = DiskStore::new(tmp.path());
//! let config = DeckConfig::default();
//! let mutator = Mutator::new(&store, &config);
//!
//! let contents = deck_contents(&mutator, &fixture_slide_paths());
//! assert!(contents[0].starts_with("# Welcome"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::index::{IndexError, IndexSource};
use crate::mutate::Mutator;
use crate::store::SlideStore;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/deck/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deck");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Import paths of the fixture deck, in deck order.
pub fn fixture_slide_paths() -> Vec<String> {
    (1..=3).map(|n| format!("./stories/slides/{n}.mdx")).collect()
}

/// Contents of the fixture `index.json`.
pub fn fixture_index_json() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deck/storybook-static/index.json");
    std::fs::read_to_string(path).unwrap()
}

// =========================================================================
// Index sources
// =========================================================================

/// Index source serving a fixed JSON document, counting fetches.
pub struct StaticSource {
    pub json: String,
    pub fetches: std::cell::Cell<usize>,
}

impl StaticSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            fetches: std::cell::Cell::new(0),
        }
    }
}

impl IndexSource for StaticSource {
    fn fetch(&self) -> Result<String, IndexError> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(self.json.clone())
    }
}

/// Flat index JSON with one docs entry per id, in the given order.
pub fn index_json(ids: &[&str]) -> String {
    let entries: Vec<String> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                r#""{id}": {{"id": "{id}", "title": "T{i}", "name": "Docs", "importPath": "./stories/{i}.mdx", "type": "docs"}}"#
            )
        })
        .collect();
    format!(r#"{{"v": 5, "entries": {{{}}}}}"#, entries.join(", "))
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Slide content of every path, in order. Panics on the first failure.
pub fn deck_contents<S: SlideStore>(mutator: &Mutator<S>, paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .map(|path| {
            mutator
                .read_content(path)
                .unwrap_or_else(|e| panic!("reading {path}: {e}"))
        })
        .collect()
}
