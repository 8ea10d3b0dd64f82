//! Slide collection mutations: move, delete and insert.
//!
//! Every operation works on an ordered list of import paths supplied by the
//! caller (the deck's sibling group) and is expressed as **content moves
//! between files**. Files are never renamed, so anything that points at a fixed
//! path (bookmarks, links, the host's index) keeps pointing at a valid slide.
//!
//! ```text
//! delete(p2, [p0 p1 p2 p3 p4])        insert_at(1, [p0 p1 p2], NEW)
//!
//!   p2 ← p3                             create p3' (template)
//!   p3 ← p4                             p3' ← p2
//!   remove p4                           p2  ← p1
//!                                       p1  ← NEW
//! ```
//!
//! Both delete and insert rewrite every file after the affected position,
//! O(n) rewrites for one logical change. Decks are small; this keeps every
//! operation a plain sequence of single-file rewrites.
//!
//! ## Numbering
//!
//! A new slide file is always named `{max + 1}.{ext}`, where `max` covers the
//! numbers in the supplied list *and* the numbered files already on disk, so a
//! new file can never land on an existing one. Filenames drift away from
//! logical position over time; nothing reads them as an ordering signal.

use crate::config::DeckConfig;
use crate::naming;
use crate::slide::{self, SlideError};
use crate::store::SlideStore;

/// Applies slide-level operations to files in a [`SlideStore`].
pub struct Mutator<'a, S: SlideStore> {
    store: &'a S,
    config: &'a DeckConfig,
}

impl<'a, S: SlideStore> Mutator<'a, S> {
    pub fn new(store: &'a S, config: &'a DeckConfig) -> Self {
        Self { store, config }
    }

    /// Slide content of one file.
    pub fn read_content(&self, import_path: &str) -> Result<String, SlideError> {
        let source = self.store.read(import_path)?;
        slide::extract(&source, &self.config.component, import_path)
    }

    /// Overwrite the slide content of one file, keeping everything around
    /// the content block.
    pub fn save(&self, import_path: &str, content: &str) -> Result<(), SlideError> {
        let source = self.store.read(import_path)?;
        let updated = slide::replace(&source, content, &self.config.component, import_path)?;
        self.store.write(import_path, &updated)
    }

    /// Exchange the slide contents of two files.
    ///
    /// Both replacements are computed before either file is written.
    pub fn swap(&self, a: &str, b: &str) -> Result<(), SlideError> {
        let component = &self.config.component;
        let source_a = self.store.read(a)?;
        let source_b = self.store.read(b)?;
        let content_a = slide::extract(&source_a, component, a)?;
        let content_b = slide::extract(&source_b, component, b)?;

        let updated_a = slide::replace(&source_a, &content_b, component, a)?;
        let updated_b = slide::replace(&source_b, &content_a, component, b)?;

        self.store.write(a, &updated_a)?;
        self.store.write(b, &updated_b)?;
        tracing::debug!(a, b, "swapped slide contents");
        Ok(())
    }

    /// Move a slide one position up by swapping with its predecessor.
    pub fn move_up(&self, import_path: &str, previous: &str) -> Result<(), SlideError> {
        self.swap(import_path, previous)
    }

    /// Move a slide one position down by swapping with its successor.
    pub fn move_down(&self, import_path: &str, next: &str) -> Result<(), SlideError> {
        self.swap(import_path, next)
    }

    /// Remove `target`'s content from the deck: later slides shift up one
    /// slot and the last file is deleted.
    pub fn delete(&self, target: &str, all: &[String]) -> Result<(), SlideError> {
        let index = all
            .iter()
            .position(|path| path == target)
            .ok_or_else(|| SlideError::NotInDeck(target.to_string()))?;

        for i in index..all.len() - 1 {
            let next_content = self.read_content(&all[i + 1])?;
            self.save(&all[i], &next_content)?;
        }

        let last = &all[all.len() - 1];
        self.store.remove(last)?;
        tracing::debug!(target, removed = %last, shifted = all.len() - 1 - index, "deleted slide");
        Ok(())
    }

    /// Insert `content` at logical position `index`, returning the import
    /// path of the newly created file.
    pub fn insert_at(
        &self,
        index: usize,
        all: &[String],
        content: &str,
    ) -> Result<String, SlideError> {
        if index > all.len() {
            return Err(SlideError::IndexOutOfRange {
                index,
                len: all.len(),
            });
        }

        // Reject bad content before any file is created.
        slide::validate_content(content, &self.config.component)?;

        let extension = &self.config.extension;
        let on_disk = self
            .store
            .slide_numbers(&self.config.slides_dir, extension)?;
        let listed = all
            .iter()
            .filter_map(|path| naming::parse_slide_number(path, extension));
        let number = naming::next_slide_number(listed.chain(on_disk)).map_err(|last| {
            SlideError::NumbersExhausted {
                last,
                slides_dir: self.config.slides_dir.clone(),
            }
        })?;
        let new_path = naming::slide_import_path(&self.config.slides_dir, number, extension);

        self.store
            .create(&new_path, &slide::render_template(self.config, number, content))?;

        // Right-shift from the tail down to the insertion point; the former
        // last slide moves into the new file.
        for i in (index..all.len()).rev() {
            let destination = if i == all.len() - 1 {
                new_path.as_str()
            } else {
                all[i + 1].as_str()
            };
            let current = self.read_content(&all[i])?;
            self.save(destination, &current)?;
        }

        if index < all.len() {
            self.save(&all[index], content)?;
        }

        tracing::debug!(index, new_path = %new_path, "inserted slide");
        Ok(new_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DiskStore;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn deck(contents: &[&str]) -> (TempDir, DiskStore, Vec<String>) {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::new(tmp.path());
        let config = DeckConfig::default();
        let paths = contents
            .iter()
            .enumerate()
            .map(|(i, content)| {
                let number = i as u32 + 1;
                let path = naming::slide_import_path(&config.slides_dir, number, "mdx");
                store
                    .create(&path, &slide::render_template(&config, number, content))
                    .unwrap();
                path
            })
            .collect();
        (tmp, store, paths)
    }

    #[test]
    fn swap_exchanges_contents() {
        let (_tmp, store, paths) = deck(&["A", "B"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        mutator.swap(&paths[0], &paths[1]).unwrap();
        assert_eq!(deck_contents(&mutator, &paths), ["B", "A"]);
    }

    #[test]
    fn swap_twice_restores_files() {
        let (_tmp, store, paths) = deck(&["A", "B"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);
        let before: Vec<String> = paths.iter().map(|p| store.read(p).unwrap()).collect();

        mutator.swap(&paths[0], &paths[1]).unwrap();
        mutator.swap(&paths[0], &paths[1]).unwrap();

        let after: Vec<String> = paths.iter().map(|p| store.read(p).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn swap_keeps_each_files_title() {
        let (_tmp, store, paths) = deck(&["A", "B"]);
        let config = DeckConfig::default();
        Mutator::new(&store, &config).swap(&paths[0], &paths[1]).unwrap();
        assert!(store.read(&paths[0]).unwrap().contains("title=\"Slide 1\""));
        assert!(store.read(&paths[1]).unwrap().contains("title=\"Slide 2\""));
    }

    #[test]
    fn swap_with_missing_block_writes_nothing() {
        let (_tmp, store, paths) = deck(&["A"]);
        store.create("./stories/slides/9.mdx", "# no block\n").unwrap();
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        let err = mutator.swap(&paths[0], "./stories/slides/9.mdx").unwrap_err();
        assert!(matches!(err, SlideError::NotFound { .. }));
        assert_eq!(mutator.read_content(&paths[0]).unwrap(), "A");
    }

    #[test]
    fn move_up_and_down_are_swaps() {
        let (_tmp, store, paths) = deck(&["A", "B", "C"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        mutator.move_up(&paths[2], &paths[1]).unwrap();
        assert_eq!(deck_contents(&mutator, &paths), ["A", "C", "B"]);
        mutator.move_down(&paths[0], &paths[1]).unwrap();
        assert_eq!(deck_contents(&mutator, &paths), ["C", "A", "B"]);
    }

    #[test]
    fn delete_shifts_later_slides_and_removes_last_file() {
        let (tmp, store, paths) = deck(&["p0", "p1", "p2", "p3", "p4"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        mutator.delete(&paths[2], &paths).unwrap();

        assert_eq!(deck_contents(&mutator, &paths[..4]), ["p0", "p1", "p3", "p4"]);
        assert!(!tmp.path().join("stories/slides/5.mdx").exists());
    }

    #[test]
    fn delete_last_slide_only_removes_it() {
        let (tmp, store, paths) = deck(&["p0", "p1"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        mutator.delete(&paths[1], &paths).unwrap();
        assert_eq!(mutator.read_content(&paths[0]).unwrap(), "p0");
        assert!(!tmp.path().join("stories/slides/2.mdx").exists());
    }

    #[test]
    fn delete_unknown_target_is_not_in_deck() {
        let (_tmp, store, paths) = deck(&["p0"]);
        let config = DeckConfig::default();
        let err = Mutator::new(&store, &config)
            .delete("./stories/slides/42.mdx", &paths)
            .unwrap_err();
        assert!(matches!(err, SlideError::NotInDeck(_)));
    }

    #[test]
    fn insert_in_middle_shifts_content() {
        let (_tmp, store, paths) = deck(&["p0", "p1", "p2"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        let new_path = mutator.insert_at(1, &paths, "NEW").unwrap();
        assert_eq!(new_path, "./stories/slides/4.mdx");

        let mut order = paths.clone();
        order.push(new_path);
        assert_eq!(deck_contents(&mutator, &order), ["p0", "NEW", "p1", "p2"]);
    }

    #[test]
    fn insert_at_front() {
        let (_tmp, store, paths) = deck(&["p0", "p1"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        let new_path = mutator.insert_at(0, &paths, "NEW").unwrap();
        let mut order = paths.clone();
        order.push(new_path);
        assert_eq!(deck_contents(&mutator, &order), ["NEW", "p0", "p1"]);
    }

    #[test]
    fn insert_at_end_only_creates_file() {
        let (_tmp, store, paths) = deck(&["p0", "p1"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        let new_path = mutator.insert_at(2, &paths, "NEW").unwrap();
        assert_eq!(deck_contents(&mutator, &paths), ["p0", "p1"]);
        assert_eq!(mutator.read_content(&new_path).unwrap(), "NEW");
    }

    #[test]
    fn insert_into_empty_deck_creates_first_slide() {
        let (_tmp, store, _) = deck(&[]);
        let config = DeckConfig::default();
        let new_path = Mutator::new(&store, &config).insert_at(0, &[], "").unwrap();
        assert_eq!(new_path, "./stories/slides/1.mdx");
        assert!(store.read(&new_path).unwrap().contains("<Slide>\n</Slide>"));
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let (_tmp, store, paths) = deck(&["p0"]);
        let config = DeckConfig::default();
        let err = Mutator::new(&store, &config)
            .insert_at(3, &paths, "x")
            .unwrap_err();
        assert!(matches!(err, SlideError::IndexOutOfRange { index: 3, len: 1 }));
        assert!(store.read("./stories/slides/2.mdx").is_err());
    }

    #[test]
    fn insert_skips_numbers_already_on_disk() {
        let (_tmp, store, paths) = deck(&["p0", "p1"]);
        store
            .create("./stories/slides/7.mdx", "<Slide>\norphan\n</Slide>\n")
            .unwrap();
        let config = DeckConfig::default();

        let new_path = Mutator::new(&store, &config)
            .insert_at(2, &paths, "NEW")
            .unwrap();
        assert_eq!(new_path, "./stories/slides/8.mdx");
    }

    #[test]
    fn insert_with_invalid_content_fails() {
        let (_tmp, store, paths) = deck(&["p0", "p1"]);
        let config = DeckConfig::default();
        let err = Mutator::new(&store, &config)
            .insert_at(0, &paths, "<Columns>\n\nopen")
            .unwrap_err();
        assert!(matches!(err, SlideError::InvalidContent(_)));
        assert!(store.read("./stories/slides/3.mdx").is_err());
    }

    #[test]
    fn save_rewrites_only_the_block() {
        let (_tmp, store, paths) = deck(&["old"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        mutator.save(&paths[0], "# fresh").unwrap();
        let source = store.read(&paths[0]).unwrap();
        assert!(source.starts_with("import { Meta }"));
        assert_eq!(mutator.read_content(&paths[0]).unwrap(), "# fresh");
    }

    #[test]
    fn save_round_trips_content_that_opens_with_markup() {
        let (_tmp, store, paths) = deck(&["old"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);

        for content in [
            "```ts\nconst m = new Map<string, number>();\n```",
            "# Types\n\n```rust\nfn f<T: Into<String>>(t: T) {}\n```\n\nAfter.",
            "<!-- speaker note -->\n# Title",
            "<!--\nmulti-line note\n-->\n\nBody",
            "<Columns>\n<Column>\n# Left\n</Column>\n<Column>\n# Right\n</Column>\n</Columns>",
            "if a<b then `<Slide>` is quoted",
        ] {
            mutator.save(&paths[0], content).unwrap();
            assert_eq!(mutator.read_content(&paths[0]).unwrap(), content);
        }
    }

    #[test]
    fn save_that_would_swallow_the_close_writes_nothing() {
        let (_tmp, store, paths) = deck(&["old"]);
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);
        let before = store.read(&paths[0]).unwrap();

        for content in ["# T\n\n```js\nlet a = 1;", "# T\n\n<!-- unfinished note"] {
            let err = mutator.save(&paths[0], content).unwrap_err();
            assert!(matches!(err, SlideError::InvalidContent(_)), "{content:?}: {err:?}");
        }
        assert_eq!(store.read(&paths[0]).unwrap(), before);
        assert_eq!(mutator.read_content(&paths[0]).unwrap(), "old");
    }

    #[test]
    fn insert_with_unterminated_fence_creates_nothing() {
        let (_tmp, store, paths) = deck(&["p0", "p1"]);
        let config = DeckConfig::default();
        let err = Mutator::new(&store, &config)
            .insert_at(0, &paths, "```js\nlet a = 1;")
            .unwrap_err();
        assert!(matches!(err, SlideError::InvalidContent(_)));
        assert!(store.read("./stories/slides/3.mdx").is_err());
    }

    #[test]
    fn insert_after_largest_number_is_exhausted() {
        let (_tmp, store, mut paths) = deck(&["p0"]);
        paths.push(format!("./stories/slides/{}.mdx", u32::MAX));
        let config = DeckConfig::default();
        let err = Mutator::new(&store, &config)
            .insert_at(1, &paths, "NEW")
            .unwrap_err();
        assert!(matches!(err, SlideError::NumbersExhausted { last: u32::MAX, .. }));
        assert_eq!(store.slide_numbers(&config.slides_dir, "mdx").unwrap(), [1]);
    }

    #[test]
    fn fixture_deck_contents() {
        let tmp = setup_fixtures();
        let store = DiskStore::new(tmp.path());
        let config = DeckConfig::default();
        let mutator = Mutator::new(&store, &config);
        let contents = deck_contents(&mutator, &fixture_slide_paths());
        assert!(contents[0].starts_with("# Welcome"));
        assert!(contents[2].starts_with("# Thanks"));
    }
}
