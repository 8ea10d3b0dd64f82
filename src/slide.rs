//! Slide content extraction and replacement.
//!
//! A slide file holds exactly one designated content block, `<Slide>...</Slide>`
//! by default, and the block's children are the slide's visible content. These
//! functions are pure text transforms over one file's source: reading from and
//! writing to disk is the caller's job (see [`crate::mutate`]).
//!
//! ## Empty blocks
//!
//! A block that is present but empty (`<Slide></Slide>`, `<Slide />`) is a
//! valid slide with empty content. Only a *missing* block is
//! [`SlideError::NotFound`].
//!
//! ## Canonical form
//!
//! [`replace`] always writes the block body as `"\n" + content + "\n"`, with
//! the content trimmed. Files created by [`render_template`] use the same
//! shape, so for any file in canonical form `replace(f, extract(f)) == f`, and
//! `replace` is idempotent for every file.

use crate::config::DeckConfig;
use crate::markup::{self, Document, MarkupError};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideError {
    #[error("No {component} component found in {path}")]
    NotFound { component: String, path: String },
    #[error("Target slide not found in slide list: {0}")]
    NotInDeck(String),
    #[error("Cannot insert at index {index}: deck has {len} slides")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Invalid MDX content: {0}")]
    InvalidContent(#[source] MarkupError),
    #[error("{path} is not valid MDX: {source}")]
    Markup {
        path: String,
        #[source]
        source: MarkupError,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Content would not read back unchanged from {path}")]
    NotPreserved { path: String },
    #[error("Import path escapes the project root: {0}")]
    OutsideRoot(String),
    #[error("No slide number left after {last} in {slides_dir}")]
    NumbersExhausted { last: u32, slides_dir: String },
}

impl SlideError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn parse_file(source: &str, path: &str) -> Result<Document, SlideError> {
    Document::parse(source).map_err(|source| SlideError::Markup {
        path: path.to_string(),
        source,
    })
}

/// Block body in canonical form.
fn block_body(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        "\n".to_string()
    } else {
        format!("\n{content}\n")
    }
}

/// Return the trimmed children source of the first flow `component` element.
///
/// `path` only labels errors.
pub fn extract(source: &str, component: &str, path: &str) -> Result<String, SlideError> {
    let doc = parse_file(source, path)?;
    let block = doc.find_flow(component).ok_or_else(|| SlideError::NotFound {
        component: component.to_string(),
        path: path.to_string(),
    })?;
    Ok(doc.slice(block.inner()).trim().to_string())
}

/// Check that `content` reads back unchanged once wrapped in a bare
/// `component` block.
///
/// Content can parse on its own and still break the file around it: an
/// unterminated fence or comment swallows the closing tag.
pub fn validate_content(content: &str, component: &str) -> Result<(), SlideError> {
    Document::parse(content).map_err(SlideError::InvalidContent)?;
    let wrapped = format!("<{component}>{}</{component}>\n", block_body(content));
    read_back(&wrapped, content, component, "new content")
}

/// Extract from freshly spliced `output` and compare against what was written.
fn read_back(output: &str, content: &str, component: &str, path: &str) -> Result<(), SlideError> {
    let extracted = match extract(output, component, path) {
        Ok(extracted) => extracted,
        Err(SlideError::Markup { source, .. }) => return Err(SlideError::InvalidContent(source)),
        Err(err) => return Err(err),
    };
    if extracted != content.trim() {
        return Err(SlideError::NotPreserved {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Replace the children of the first flow `component` element with
/// `new_content`, returning the updated file source.
///
/// The spliced output is parsed again and must yield `new_content` back;
/// otherwise the call fails with [`SlideError::InvalidContent`] or
/// [`SlideError::NotPreserved`] and nothing is produced.
pub fn replace(
    source: &str,
    new_content: &str,
    component: &str,
    path: &str,
) -> Result<String, SlideError> {
    let doc = parse_file(source, path)?;
    Document::parse(new_content).map_err(SlideError::InvalidContent)?;

    let block = doc.find_flow(component).ok_or_else(|| SlideError::NotFound {
        component: component.to_string(),
        path: path.to_string(),
    })?;
    let body = block_body(new_content);

    let Some(close) = &block.close else {
        // `<Slide />` grows into an open/close pair.
        let open = doc.slice(block.open.clone());
        let head = open
            .trim_end_matches('>')
            .trim_end()
            .trim_end_matches('/')
            .trim_end();
        let output = doc.splice(
            block.open.clone(),
            &format!("{head}>{body}</{component}>"),
        );
        read_back(&output, new_content, component, path)?;
        return Ok(output);
    };

    // Keep the closing tag's indentation when it sits on its own line.
    let close_line = markup::line_start(doc.source(), close.start);
    let end = if close_line >= block.open.end
        && doc.source()[close_line..close.start].trim().is_empty()
    {
        close_line
    } else {
        close.start
    };
    let output = doc.splice(block.open.end..end, &body);
    read_back(&output, new_content, component, path)?;
    Ok(output)
}

/// Source of a new slide file: import lines, a title directive, and one
/// content block wrapping `content`.
pub fn render_template(config: &DeckConfig, number: u32, content: &str) -> String {
    let title = config.template.title.replace("{n}", &number.to_string());
    let component = &config.component;
    let mut out = String::new();
    for line in &config.template.imports {
        out.push_str(line);
        out.push('\n');
    }
    if !config.template.imports.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("<Meta title=\"{}\" />\n\n", title.replace('"', "&quot;")));
    out.push_str(&format!("<{component}>{}</{component}>\n", block_body(content)));
    out
}
