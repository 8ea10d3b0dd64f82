//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every slide leads with
//! its position in the deck and its title; the import path that backs it is
//! secondary context on an indented `Source:` line. Filenames drift away from
//! deck order as slides are moved (content moves, files don't), so showing
//! the path first would read as the wrong order.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Slides (3 slides)
//! 001 Slide 1
//!     Source: ./stories/slides/1.mdx
//!     Preview: # Welcome
//! 002 Slide 2 (current)
//!     Source: ./stories/slides/2.mdx
//! ```
//!
//! ## Links
//!
//! ```text
//! slides-slide-2--docs
//!     Prev: ?path=/docs/slides-slide-1--docs
//!     Next: (none)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::index::{CurrentLinks, IndexEntry};

const PREVIEW_WIDTH: usize = 60;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Last segment of a hierarchical title: `Slides/Slide 2` → `Slide 2`.
fn leaf_title(title: &str) -> &str {
    title.rsplit('/').next().unwrap_or(title).trim()
}

/// First non-blank line of `content`, truncated to `max` characters.
fn preview_line(content: &str, max: usize) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() <= max {
        Some(line.to_string())
    } else {
        let cut: String = line.chars().take(max).collect();
        Some(format!("{cut}..."))
    }
}

/// One row of a deck listing.
pub struct SlideSummary<'a> {
    pub entry: &'a IndexEntry,
    /// Slide content, when it could be read.
    pub content: Option<String>,
}

/// Format a deck listing.
///
/// Titles fall back to the page id when the index has none.
pub fn format_deck(deck_name: &str, slides: &[SlideSummary], current: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    let noun = if slides.len() == 1 { "slide" } else { "slides" };
    lines.push(format!("{} ({} {})", deck_name, slides.len(), noun));

    for (i, slide) in slides.iter().enumerate() {
        let entry = slide.entry;
        let title = match leaf_title(&entry.title) {
            "" => entry.id.as_str(),
            title => title,
        };
        let marker = if current == Some(entry.id.as_str()) {
            " (current)"
        } else {
            ""
        };
        lines.push(format!("{} {}{}", format_index(i + 1), title, marker));
        lines.push(format!("{}Source: {}", indent(1), entry.import_path));
        if let Some(preview) = slide
            .content
            .as_deref()
            .and_then(|c| preview_line(c, PREVIEW_WIDTH))
        {
            lines.push(format!("{}Preview: {}", indent(1), preview));
        }
    }
    lines
}

pub fn print_deck(deck_name: &str, slides: &[SlideSummary], current: Option<&str>) {
    for line in format_deck(deck_name, slides, current) {
        println!("{}", line);
    }
}

/// Format the previous/next navigation targets of one page.
pub fn format_links(story_id: &str, links: &CurrentLinks) -> Vec<String> {
    let show = |path: &Option<String>| path.clone().unwrap_or_else(|| "(none)".to_string());
    vec![
        story_id.to_string(),
        format!("{}Prev: {}", indent(1), show(&links.prev_path)),
        format!("{}Next: {}", indent(1), show(&links.next_path)),
    ]
}

pub fn print_links(story_id: &str, links: &CurrentLinks) {
    for line in format_links(story_id, links) {
        println!("{}", line);
    }
}

/// Format the result of creating a slide at deck position `position` (0-based).
pub fn format_inserted(position: usize, new_import_path: &str) -> String {
    format!(
        "Inserted slide {} → {}",
        format_index(position + 1),
        new_import_path
    )
}
