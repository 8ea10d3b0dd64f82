//! # Slideset
//!
//! A slide-deck editor for Storybook MDX. Each slide is an MDX file holding one
//! `<Slide>` block; a deck is the set of docs pages whose ids differ only in
//! the slide number. Slideset reorders, inserts and deletes slides by moving
//! block contents between files, so every file keeps its path and every link
//! to a slide page keeps working.
//!
//! # Architecture: Client, Router, Files
//!
//! ```text
//! sidebar action ─→ Client ──request──→ Router ─→ Mutator ─→ slide files
//!  (page ids)       (index → paths)  ←response──   (content moves)
//! ```
//!
//! - The **client** speaks in page ids and uses the linked page index to turn
//!   "move this slide up" into "swap the contents of these two import paths".
//! - The **router** answers each named request with exactly one correlated
//!   response. It holds no state; the caller always sends the full list of
//!   paths an operation touches.
//! - The **mutator** rewrites files one at a time through the extractor and
//!   replacer, which only ever touch the inside of the `<Slide>` block.
//!
//! The request channel is line-delimited JSON (`slideset serve`), or an
//! in-process call when the CLI drives the router directly.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`markup`] | Lossless MDX element tree: JSX spans over `pulldown-cmark` |
//! | [`slide`] | Extract and replace the `<Slide>` block; new-slide template |
//! | [`store`] | `SlideStore` trait and the root-confined disk store |
//! | [`mutate`] | Swap, delete and insert as content shifts over a path list |
//! | [`protocol`] | Operation names, typed payloads, request/response envelopes |
//! | [`router`] | Request dispatch and the line-delimited serve loop |
//! | [`index`] | Linked page index, decks, prev/next links, the index cache |
//! | [`client`] | Request façade over a transport |
//! | [`drag`] | Sidebar drag-and-drop state machine and drop positions |
//! | [`config`] | `slideset.toml` loading, merging over defaults, validation |
//! | [`naming`] | `{n}.mdx` slide filename convention |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Moves, Never Renames
//!
//! Moving slide 3 up swaps the block contents of `2.mdx` and `3.mdx`. The host
//! keys pages by file, so a rename would break bookmarks and leave the page
//! index pointing at files that no longer exist. The cost is that filenames
//! stop reflecting order; nothing reads them as an ordering signal.
//!
//! ## Splice, Don't Re-Render
//!
//! [`markup`] records byte spans instead of building a full AST that would
//! have to be printed back. Replacing a slide splices new text between two
//! offsets, so imports, comments, formatting and everything outside the block
//! survive byte for byte.
//!
//! ## One Ordering
//!
//! Deck order is the order of the host's page index. Sibling lists, position
//! lookups and prev/next links all derive from that one sequence (see
//! [`index`]), so "the slide after this one" means the same thing to the
//! navigation buttons and to the move commands.
//!
//! ## Empty Slides Are Slides
//!
//! `<Slide></Slide>` and `<Slide />` are valid slides with empty content. Only
//! a file without the block is an error, which keeps freshly inserted blank
//! slides movable and deletable.

pub mod client;
pub mod config;
pub mod drag;
pub mod index;
pub mod markup;
pub mod mutate;
pub mod naming;
pub mod output;
pub mod protocol;
pub mod router;
pub mod slide;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
