//! Linked page index.
//!
//! The host publishes a flat page index, `{ "v": 5, "entries": { id -> entry } }`.
//! This module turns it into a doubly-linked structure keyed by page id, so
//! "what comes before/after this page" is a map lookup instead of a scan.
//!
//! ## Ordering
//!
//! Entry order is the order the host wrote the mapping, preserved through
//! deserialization by `IndexMap`. That single order is canonical for
//! everything here:
//!
//! - `prev`/`next` links follow it directly.
//! - A deck's *sibling group* is the subsequence of entries in the same deck.
//! - Prev/next navigation walks the links to the nearest entry of the same
//!   deck, so it always agrees with the sibling group.
//!
//! ## Decks
//!
//! Slide pages have ids ending in `<number>--docs`. Everything before the
//! number is the deck prefix: `slides-slide-12--docs` belongs to the
//! `slides-slide-` deck. An entry is in a deck when its id is exactly the
//! prefix, a number, and `--docs`.
//!
//! ## Lifecycle
//!
//! [`IndexCache`] owns the built index. It is built on demand, rebuilt when
//! the host reports [`HostEvent::IndexInvalidated`], and read-only to every
//! other consumer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// The only flat index schema version this module understands.
pub const INDEX_VERSION: u64 = 5;

const DOCS_SUFFIX: &str = "--docs";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Unsupported index version {found:?}, expected {}", INDEX_VERSION)]
    UnsupportedVersion { found: Option<u64> },
    #[error("Index is empty after rebuilding; the host has not published any pages yet")]
    StaleIndex,
    #[error("Story not found in index: {0}")]
    UnknownStory(String),
    #[error("No current story id")]
    MissingId,
    #[error("Cannot read index {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed index: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether an entry is a docs page or a component story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Docs,
    Story,
}

impl EntryKind {
    /// Path segment the host uses in navigation URLs.
    pub fn segment(self) -> &'static str {
        match self {
            EntryKind::Docs => "docs",
            EntryKind::Story => "story",
        }
    }
}

/// One page of the flat index. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub import_path: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The host's flat index document.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatIndex {
    pub v: u64,
    pub entries: IndexMap<String, IndexEntry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    v: Option<u64>,
}

/// Parse a flat index, rejecting any schema version but [`INDEX_VERSION`].
pub fn parse_flat_index(json: &str) -> Result<FlatIndex, IndexError> {
    let probe: VersionProbe = serde_json::from_str(json)?;
    if probe.v != Some(INDEX_VERSION) {
        return Err(IndexError::UnsupportedVersion { found: probe.v });
    }
    Ok(serde_json::from_str(json)?)
}

/// An index entry with links to its neighbours in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedEntry {
    pub data: IndexEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Direction along the linked index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Doubly-linked page index keyed by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkedIndex {
    entries: IndexMap<String, LinkedEntry>,
}

impl LinkedIndex {
    /// Link the flat index's entries in their received order.
    pub fn from_flat(flat: FlatIndex) -> Self {
        let ids: Vec<String> = flat.entries.keys().cloned().collect();
        let entries = flat
            .entries
            .into_iter()
            .enumerate()
            .map(|(i, (id, data))| {
                let linked = LinkedEntry {
                    data,
                    prev: i.checked_sub(1).map(|p| ids[p].clone()),
                    next: ids.get(i + 1).cloned(),
                };
                (id, linked)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&LinkedEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkedEntry> {
        self.entries.values()
    }

    fn require(&self, id: &str) -> Result<&LinkedEntry, IndexError> {
        self.get(id)
            .ok_or_else(|| IndexError::UnknownStory(id.to_string()))
    }

    /// Entries in the same deck as `id`, in index order.
    pub fn siblings(&self, id: &str) -> Result<Vec<&IndexEntry>, IndexError> {
        self.require(id)?;
        let prefix = deck_prefix(id);
        Ok(self
            .entries
            .values()
            .map(|entry| &entry.data)
            .filter(|data| in_deck(prefix, &data.id))
            .collect())
    }

    /// Import paths of the deck containing `id`, in deck order.
    pub fn sibling_import_paths(&self, id: &str) -> Result<Vec<String>, IndexError> {
        Ok(self
            .siblings(id)?
            .into_iter()
            .map(|data| data.import_path.clone())
            .collect())
    }

    /// Position of `id` within its deck, `None` when `id` is not a slide.
    pub fn position_in_deck(&self, id: &str) -> Result<Option<usize>, IndexError> {
        Ok(self.siblings(id)?.iter().position(|data| data.id == id))
    }

    /// Nearest entry of the same deck in `direction`, following the links.
    pub fn neighbour_in_deck(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<Option<&IndexEntry>, IndexError> {
        let prefix = deck_prefix(id);
        let mut cursor = self.require(id)?;
        loop {
            let step = match direction {
                Direction::Prev => cursor.prev.as_deref(),
                Direction::Next => cursor.next.as_deref(),
            };
            let Some(step) = step.and_then(|next_id| self.get(next_id)) else {
                return Ok(None);
            };
            if in_deck(prefix, &step.data.id) {
                return Ok(Some(&step.data));
            }
            cursor = step;
        }
    }
}

/// The deck prefix of an id: the id minus its trailing `<number>--docs`.
/// Ids without that suffix are their own prefix (and belong to no deck).
pub fn deck_prefix(id: &str) -> &str {
    let Some(stem) = id.strip_suffix(DOCS_SUFFIX) else {
        return id;
    };
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    if prefix.len() == stem.len() {
        id
    } else {
        prefix
    }
}

/// Whether `id` is `prefix` followed by a number and `--docs`.
pub fn in_deck(prefix: &str, id: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(DOCS_SUFFIX))
        .is_some_and(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
}

/// Host navigation path of an entry, `?path=/docs/<id>`.
pub fn nav_path(entry: &IndexEntry) -> String {
    format!("?path=/{}/{}", entry.kind.segment(), entry.id)
}

/// Where the current page's previous/next buttons lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLinks {
    pub prev_path: Option<String>,
    pub next_path: Option<String>,
}

/// Supplies the raw flat index document.
pub trait IndexSource {
    fn fetch(&self) -> Result<String, IndexError>;
}

/// Flat index read from a file, typically a static build's `index.json`.
#[derive(Debug, Clone)]
pub struct FileIndexSource {
    path: PathBuf,
}

impl FileIndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IndexSource for FileIndexSource {
    fn fetch(&self) -> Result<String, IndexError> {
        fs::read_to_string(&self.path).map_err(|source| IndexError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Fetch, version-check and link the flat index.
pub fn build_index(source: &impl IndexSource) -> Result<LinkedIndex, IndexError> {
    let flat = parse_flat_index(&source.fetch()?)?;
    let index = LinkedIndex::from_flat(flat);
    tracing::debug!(entries = index.len(), "built linked index");
    Ok(index)
}

/// Signals from the host that affect the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The host's page index changed; the linked index must be rebuilt.
    IndexInvalidated,
    /// The user navigated to another page.
    CurrentStoryChanged(String),
}

/// Owner of the linked index and the current page's links.
pub struct IndexCache<S: IndexSource> {
    source: S,
    index: Option<LinkedIndex>,
    current: Option<(String, CurrentLinks)>,
}

impl<S: IndexSource> IndexCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            index: None,
            current: None,
        }
    }

    /// Fetch and link the index, replacing any cached copy.
    pub fn build(&mut self) -> Result<&LinkedIndex, IndexError> {
        let index = build_index(&self.source)?;
        Ok(&*self.index.insert(index))
    }

    /// The cached index, building it first if needed.
    pub fn ensure(&mut self) -> Result<&LinkedIndex, IndexError> {
        if self.index.is_none() {
            self.build()?;
        }
        self.index.as_ref().ok_or(IndexError::StaleIndex)
    }

    /// The cached index, if built.
    pub fn index(&self) -> Option<&LinkedIndex> {
        self.index.as_ref()
    }

    /// Drop the cached index; the next read rebuilds it.
    pub fn invalidate(&mut self) {
        self.index = None;
    }

    /// Previous/next navigation paths for `current_id` within its deck.
    pub fn resolve_current_links(
        &mut self,
        current_id: Option<&str>,
    ) -> Result<CurrentLinks, IndexError> {
        let id = current_id.ok_or(IndexError::MissingId)?;
        let index = self.ensure()?;
        if index.is_empty() {
            return Err(IndexError::StaleIndex);
        }
        let links = CurrentLinks {
            prev_path: index.neighbour_in_deck(id, Direction::Prev)?.map(nav_path),
            next_path: index.neighbour_in_deck(id, Direction::Next)?.map(nav_path),
        };
        Ok(links)
    }

    /// Current story id and its resolved links, as of the last event.
    pub fn current(&self) -> Option<(&str, &CurrentLinks)> {
        self.current
            .as_ref()
            .map(|(id, links)| (id.as_str(), links))
    }

    /// React to a host signal.
    pub fn handle(&mut self, event: HostEvent) -> Result<(), IndexError> {
        match event {
            HostEvent::IndexInvalidated => {
                tracing::debug!("index invalidated, rebuilding");
                self.build()?;
                if let Some((id, _)) = self.current.take() {
                    let links = self.resolve_current_links(Some(&id))?;
                    self.current = Some((id, links));
                }
            }
            HostEvent::CurrentStoryChanged(id) => {
                let links = self.resolve_current_links(Some(&id))?;
                tracing::debug!(story = %id, ?links, "current story changed");
                self.current = Some((id, links));
            }
        }
        Ok(())
    }
}
