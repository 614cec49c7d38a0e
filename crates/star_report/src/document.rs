//! The indented key-value document format of the handoff payload.
//!
//! ```text
//! func:
//!   max:
//!     mode_stats:
//!       func1:
//!         wns: -1.5
//!         tns: 0.5
//!         fep: 2
//! scenarios: [func_ss, func_ss_cold]
//! ```
//!
//! Every nesting level is indented by two spaces. A line ending in `:` opens a
//! map; `key: value` holds a scalar or a bracketed list. Scalars are kept as
//! text; interpretation is up to the reader.
//!
//! Keys, scalars and list items are written plain when a YAML reader would
//! take them back verbatim (`top:top`, `-0.42`, `rpts/func_max/00001.summary.rpt`)
//! and double-quoted otherwise: empty text, a leading indicator such as `[`,
//! `*` or `#`, a trailing `:`, an embedded `": "` or `" #"`, surrounding
//! whitespace, and inside lists `,` or brackets. Quoted text escapes `\\`,
//! `"`, newline and tab.

use crate::error::EmitError;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt::Write as _;

/// Indentation per nesting level.
pub const INDENT: &str = "  ";

/// A document: ordered keys to values.
pub type Document = IndexMap<String, HandoffValue>;

/// One value of a handoff document.
#[derive(Clone, Debug, PartialEq)]
pub enum HandoffValue {
    /// A scalar, kept as written.
    Scalar(String),
    /// A flat list of scalars.
    List(Vec<String>),
    /// A nested map.
    Map(Document),
}

impl HandoffValue {
    /// Creates a scalar from anything displayable.
    pub fn scalar(value: impl ToString) -> Self {
        HandoffValue::Scalar(value.to_string())
    }

    /// Returns the scalar text, or `None` for lists and maps.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            HandoffValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested map, or `None` for scalars and lists.
    pub fn as_map(&self) -> Option<&Document> {
        match self {
            HandoffValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Renders a document to text.
pub fn render_document(doc: &Document) -> String {
    let mut out = String::new();
    render_into(&mut out, doc, 0);
    out
}

fn render_into(out: &mut String, doc: &Document, level: usize) {
    let pad = INDENT.repeat(level);
    for (key, value) in doc {
        let key = text_form(key, false);
        let _ = match value {
            HandoffValue::Scalar(s) => writeln!(out, "{pad}{key}: {}", text_form(s, false)),
            HandoffValue::List(items) => {
                let items: Vec<_> = items.iter().map(|i| text_form(i, true)).collect();
                writeln!(out, "{pad}{key}: [{}]", items.join(", "))
            }
            HandoffValue::Map(map) => {
                let _ = writeln!(out, "{pad}{key}:");
                render_into(out, map, level + 1);
                Ok(())
            }
        };
    }
}

/// Characters that cannot start a plain scalar.
const INDICATORS: &[char] = &[
    '[', ']', '{', '}', ',', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];

/// Returns `true` if `text` reads back verbatim without quotes.
fn is_plain(text: &str, in_list: bool) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if INDICATORS.contains(&first) {
        return false;
    }
    // `-`, `?` and `:` are indicators only when followed by a space.
    if matches!(first, '-' | '?' | ':') && chars.next().map_or(true, |c| c == ' ') {
        return false;
    }
    if text.trim() != text || text.contains(&['\n', '\t'][..]) {
        return false;
    }
    if text.ends_with(':') || text.contains(": ") || text.contains(" #") {
        return false;
    }
    !(in_list && text.contains(&[',', '[', ']', '{', '}'][..]))
}

fn text_form(text: &str, in_list: bool) -> Cow<'_, str> {
    if is_plain(text, in_list) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

/// Reads a double-quoted string at the start of `text`.
///
/// Returns the unescaped content and the text after the closing quote.
fn read_quoted(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &body[i + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
    None
}

/// Parses a document written by [`render_document`].
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_document(text: &str) -> Result<Document, EmitError> {
    let mut stack: Vec<(String, Document)> = vec![(String::new(), Document::new())];

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let spaces = raw.len() - raw.trim_start_matches(' ').len();
        if spaces % INDENT.len() != 0 {
            return Err(EmitError::format(line, "indent is not a multiple of two spaces"));
        }
        let level = spaces / INDENT.len();
        if level >= stack.len() {
            return Err(EmitError::format(line, "unexpected indent"));
        }
        close_to(&mut stack, level + 1);

        let Some(current) = stack.last_mut() else {
            return Err(EmitError::format(line, "document stack underflow"));
        };
        let (key, value) = split_entry(content).map_err(|r| EmitError::format(line, r))?;
        let Some(value) = value else {
            stack.push((key, Document::new()));
            continue;
        };
        if current.1.contains_key(&key) {
            return Err(EmitError::format(line, format!("duplicate key '{key}'")));
        }
        let value = parse_value(value).map_err(|r| EmitError::format(line, r))?;
        current.1.insert(key, value);
    }

    close_to(&mut stack, 1);
    Ok(stack.pop().map(|(_, doc)| doc).unwrap_or_default())
}

/// Pops open maps into their parents until `depth` remain.
fn close_to(stack: &mut Vec<(String, Document)>, depth: usize) {
    while stack.len() > depth {
        if let Some((key, map)) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.1.insert(key, HandoffValue::Map(map));
            }
        }
    }
}

/// Splits a line into its key and, unless the line opens a map, its value text.
fn split_entry(content: &str) -> Result<(String, Option<&str>), String> {
    if !content.starts_with('"') {
        if let Some((key, value)) = content.split_once(": ") {
            return Ok((key.to_string(), Some(value.trim())));
        }
        return match content.strip_suffix(':') {
            Some(key) => Ok((key.to_string(), None)),
            None => Err(format!("expected 'key: value', got '{content}'")),
        };
    }
    let (key, rest) =
        read_quoted(content).ok_or_else(|| format!("unterminated quoted key in '{content}'"))?;
    match rest.strip_prefix(':') {
        Some("") => Ok((key, None)),
        Some(value) if value.starts_with(' ') => Ok((key, Some(value.trim()))),
        _ => Err(format!("expected ':' after quoted key in '{content}'")),
    }
}

fn parse_value(text: &str) -> Result<HandoffValue, String> {
    if text.starts_with('"') {
        return match read_quoted(text) {
            Some((value, "")) => Ok(HandoffValue::Scalar(value)),
            _ => Err(format!("malformed quoted scalar '{text}'")),
        };
    }
    match text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        Some(items) => parse_list(items).map(HandoffValue::List),
        None => Ok(HandoffValue::Scalar(text.to_string())),
    }
}

fn parse_list(items: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut rest = items.trim();
    if rest.is_empty() {
        return Ok(out);
    }
    loop {
        let (item, tail) = if rest.starts_with('"') {
            read_quoted(rest).ok_or_else(|| format!("unterminated quoted item in '[{items}]'"))?
        } else {
            match rest.find(',') {
                Some(i) => (rest[..i].trim_end().to_string(), &rest[i..]),
                None => (rest.to_string(), ""),
            }
        };
        out.push(item);
        let tail = tail.trim_start();
        if tail.is_empty() {
            return Ok(out);
        }
        let Some(next) = tail.strip_prefix(',') else {
            return Err(format!("expected ',' between list items in '[{items}]'"));
        };
        rest = next.trim_start();
    }
}
