//! Lossless MDX element tree.
//!
//! Slide files are MDX: markdown with JSX elements and ESM `import` lines.
//! Editing a slide only ever touches the children of one JSX element, so this
//! module does not build a full markdown AST. It records where every JSX/HTML
//! element opens and closes (byte spans into the original source) and nests
//! them into a tree. Serialization is a splice over the source, so every byte
//! outside the edited range survives untouched: import lines, comments,
//! formatting and blank lines included.
//!
//! ## Finding tags
//!
//! `pulldown-cmark` does the markdown-level work. Its offset iterator reports
//! inline HTML with source ranges, and never reports tags that sit inside
//! fenced code blocks or code spans, so a `<Slide>` shown in a code sample is
//! never mistaken for the real block. Tags are then lexed from those ranges
//! with JSX rules (quoted attribute values, `{...}` expressions, `/>`
//! self-closing, `<>` fragments).
//!
//! CommonMark HTML blocks run until the next blank line, which would turn a
//! fence or a `Map<K, V>` right after `<Slide>` into raw HTML. MDX treats a
//! tag line as a construct of its own, so only that line is lexed and
//! markdown parsing restarts on the line after it.
//!
//! MDX has no indented code blocks, so the text of indented code blocks is
//! scanned for tags like any other HTML.
//!
//! ## Flow elements
//!
//! An element is *flow* (block-level) when only whitespace precedes its
//! opening tag on its line. `<Slide>` on a line of its own is flow;
//! `Some <Badge>text</Badge>` is not.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unclosed <{name}> opened on line {line}")]
    Unclosed { name: String, line: usize },
    #[error("unexpected closing tag </{name}> on line {line}")]
    UnexpectedClose { name: String, line: usize },
    #[error("expected </{expected}> but found </{found}> on line {line}")]
    Mismatched {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("unterminated tag on line {line}")]
    Unterminated { line: usize },
}

/// HTML elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A JSX or HTML element located in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name; empty for fragments (`<>...</>`).
    pub name: String,
    /// Span of the opening tag, `<` through `>`.
    pub open: Range<usize>,
    /// Span of the closing tag; `None` for self-closing and void elements.
    pub close: Option<Range<usize>>,
    /// Whether the opening tag starts its line.
    pub flow: bool,
    pub children: Vec<Element>,
}

impl Element {
    pub fn is_self_closing(&self) -> bool {
        self.close.is_none()
    }

    /// Source span between the opening and closing tags.
    pub fn inner(&self) -> Range<usize> {
        match &self.close {
            Some(close) => self.open.end..close.start,
            None => self.open.end..self.open.end,
        }
    }
}

/// Traversal control returned by [`Document::visit`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// A parsed MDX document: the source text plus its element tree.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(source: &str) -> Result<Self, MarkupError> {
        let tokens = lex_source(source)?;
        let elements = build_tree(source, tokens)?;
        Ok(Self {
            source: source.to_string(),
            elements,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level elements in source order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.source[range]
    }

    /// Depth-first, pre-order walk over all elements. Stops as soon as the
    /// callback returns [`Visit::Stop`].
    pub fn visit<'d>(&'d self, mut f: impl FnMut(&'d Element) -> Visit) {
        fn walk<'d>(elements: &'d [Element], f: &mut impl FnMut(&'d Element) -> Visit) -> Visit {
            for element in elements {
                if f(element) == Visit::Stop {
                    return Visit::Stop;
                }
                if walk(&element.children, f) == Visit::Stop {
                    return Visit::Stop;
                }
            }
            Visit::Continue
        }
        walk(&self.elements, &mut f);
    }

    /// First flow element named `name`, in document order.
    pub fn find_flow(&self, name: &str) -> Option<&Element> {
        let mut found = None;
        self.visit(|element| {
            if element.flow && element.name == name {
                found = Some(element);
                Visit::Stop
            } else {
                Visit::Continue
            }
        });
        found
    }

    /// Source text with `range` replaced by `replacement`.
    pub fn splice(&self, range: Range<usize>, replacement: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + replacement.len());
        out.push_str(&self.source[..range.start]);
        out.push_str(replacement);
        out.push_str(&self.source[range.end..]);
        out
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Byte offset where the line containing `offset` begins.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn starts_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset].trim().is_empty()
}

/// Byte offset of the end of the line containing `offset` (its `\n` or EOF).
fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i)
}

/// One markdown parse from some offset to the first tag line.
struct Pass {
    /// Inline ranges that may contain tags, merged where contiguous.
    regions: Vec<Range<usize>>,
    /// Start of the first line that opens with a block-level tag.
    tag_line: Option<usize>,
}

fn markdown_pass(source: &str, from: usize) -> Pass {
    let mut options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    if from == 0 {
        options |= Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    }
    let mut regions: Vec<Range<usize>> = Vec::new();
    let mut in_indented_code = false;
    let mut events = Parser::new_ext(&source[from..], options)
        .into_offset_iter()
        .peekable();

    while let Some((event, range)) = events.next() {
        let range = range.start + from..range.end + from;
        let region = match event {
            Event::Start(Tag::HtmlBlock) => {
                return Pass {
                    regions,
                    tag_line: Some(range.start),
                };
            }
            // JSX lines CommonMark does not see as HTML (`{...}` attributes,
            // fragments) come through as paragraphs.
            Event::Start(Tag::Paragraph) => {
                let rest = &source[range.start..];
                let opens_with_tag = rest.starts_with("<>")
                    || rest.starts_with("</>")
                    || matches!(
                        events.peek(),
                        Some((Event::InlineHtml(_), next)) if next.start + from == range.start
                    );
                let line = &source[range.start..line_end(source, range.start)];
                if opens_with_tag && line.trim_end().ends_with('>') {
                    return Pass {
                        regions,
                        tag_line: Some(range.start),
                    };
                }
                continue;
            }
            Event::InlineHtml(_) => range,
            Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                in_indented_code = true;
                continue;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_indented_code = false;
                continue;
            }
            Event::Text(_) if in_indented_code => range,
            _ => continue,
        };
        match regions.last_mut() {
            Some(last) if last.end == region.start => last.end = region.end,
            _ => regions.push(region),
        }
    }
    Pass {
        regions,
        tag_line: None,
    }
}

/// Lex every tag in `source`, alternating markdown passes with tag lines.
fn lex_source(source: &str) -> Result<Vec<Token>, MarkupError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    loop {
        let pass = markdown_pass(source, pos);
        let mut cursor = pos;
        for region in pass.regions {
            // A tag lexed from an earlier region may run past that region's end.
            let start = region.start.max(cursor);
            if start < region.end {
                cursor = lex_region(source, start..region.end, &mut tokens)?;
            }
        }
        let Some(tag_line) = pass.tag_line else {
            return Ok(tokens);
        };
        // Always past `tag_line`: the line holds at least its `<`.
        let start = tag_line.max(cursor);
        pos = lex_region(source, start..line_end(source, start), &mut tokens)?;
    }
}

#[derive(Debug)]
enum TokenKind {
    Open { self_closing: bool },
    Close,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    name: String,
    span: Range<usize>,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':' | b'$')
}

/// Lex every tag that starts inside `region`, pushing tokens with absolute
/// spans. A tag may extend past the region end (inline HTML stops at the first
/// `>`, JSX expressions may contain more); returns the offset lexing reached.
fn lex_region(
    source: &str,
    region: Range<usize>,
    tokens: &mut Vec<Token>,
) -> Result<usize, MarkupError> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut i = region.start;

    while i < region.end {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let start = i;
        let rest = &source[i..];

        if rest.starts_with("<!--") {
            i = match rest.find("-->") {
                Some(pos) => i + pos + 3,
                None => len,
            };
            continue;
        }

        if rest.starts_with("</") {
            let mut j = i + 2;
            while j < len && is_name_byte(bytes[j]) {
                j += 1;
            }
            let name = source[i + 2..j].to_string();
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= len || bytes[j] != b'>' {
                return Err(MarkupError::Unterminated {
                    line: line_of(source, start),
                });
            }
            tokens.push(Token {
                kind: TokenKind::Close,
                name,
                span: start..j + 1,
            });
            i = j + 1;
            continue;
        }

        let opens_element = bytes
            .get(i + 1)
            .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'>');
        if !opens_element {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < len && is_name_byte(bytes[j]) {
            j += 1;
        }
        let name = source[i + 1..j].to_string();

        // Attributes: skip quoted strings and balanced `{...}` expressions.
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut closed_at = None;
        while j < len {
            let b = bytes[j];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' | b'`' => quote = Some(b),
                    b'{' => depth += 1,
                    b'}' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => {
                        closed_at = Some(j);
                        break;
                    }
                    _ => {}
                },
            }
            j += 1;
        }
        let Some(gt) = closed_at else {
            return Err(MarkupError::Unterminated {
                line: line_of(source, start),
            });
        };
        let self_closing = source[start..gt].trim_end().ends_with('/')
            || VOID_ELEMENTS.contains(&name.as_str());
        tokens.push(Token {
            kind: TokenKind::Open { self_closing },
            name,
            span: start..gt + 1,
        });
        i = gt + 1;
    }
    Ok(i)
}

fn build_tree(source: &str, tokens: Vec<Token>) -> Result<Vec<Element>, MarkupError> {
    let mut roots: Vec<Element> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    fn attach(roots: &mut Vec<Element>, stack: &mut [Element], element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => roots.push(element),
        }
    }

    for token in tokens {
        match token.kind {
            TokenKind::Open { self_closing } => {
                let element = Element {
                    flow: starts_line(source, token.span.start),
                    name: token.name,
                    open: token.span,
                    close: None,
                    children: Vec::new(),
                };
                if self_closing {
                    attach(&mut roots, &mut stack, element);
                } else {
                    stack.push(element);
                }
            }
            TokenKind::Close => {
                if VOID_ELEMENTS.contains(&token.name.as_str()) {
                    continue;
                }
                let line = line_of(source, token.span.start);
                match stack.pop() {
                    None => {
                        return Err(MarkupError::UnexpectedClose {
                            name: token.name,
                            line,
                        });
                    }
                    Some(open) if open.name != token.name => {
                        return Err(MarkupError::Mismatched {
                            expected: open.name,
                            found: token.name,
                            line,
                        });
                    }
                    Some(mut element) => {
                        element.close = Some(token.span);
                        attach(&mut roots, &mut stack, element);
                    }
                }
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MarkupError::Unclosed {
            line: line_of(source, open.open.start),
            name: open.name,
        });
    }
    Ok(roots)
}
