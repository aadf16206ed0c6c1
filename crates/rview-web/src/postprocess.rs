#![forbid(unsafe_code)]

//! Work done on content after it is inserted: code highlighting with a
//! line-number gutter, then math typesetting.
//!
//! Both steps are best-effort. A failure is logged and the inserted content
//! stays as it is.

use std::fmt;

use rview_syntax::{python_tokenizer, render_code_block};
use rview_text::unescape_html;
use tracing::{debug, warn};

use crate::document::{Document, DocumentError};

/// Failure of a post-insertion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessError {
    /// The element to process is not in the document.
    MissingScope(String),
    /// The typesetter rejected the content.
    Typeset(String),
}

impl fmt::Display for PostProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScope(id) => write!(f, "post-processing scope {id:?} is missing"),
            Self::Typeset(msg) => write!(f, "typesetting failed: {msg}"),
        }
    }
}

impl std::error::Error for PostProcessError {}

impl From<DocumentError> for PostProcessError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::MissingElement(id) => Self::MissingScope(id),
        }
    }
}

const PLAIN_BLOCK_OPEN: &str = "<pre class=\"code-block\"><code class=\"";
const BLOCK_CLOSE: &str = "</code></pre>";

/// Highlight every undecorated code block in `html` as Python and give it a
/// line-number gutter.
///
/// Decorated blocks open differently from plain ones, so running this twice
/// changes nothing the second time.
#[must_use]
pub fn decorate_code_blocks(html: &str) -> (String, usize) {
    let tokenizer = python_tokenizer();
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut decorated = 0;

    while let Some(start) = rest.find(PLAIN_BLOCK_OPEN) {
        let after_open = &rest[start + PLAIN_BLOCK_OPEN.len()..];
        let Some(tag_end) = open_tag_end(after_open) else {
            break;
        };
        let body = &after_open[tag_end + 1..];
        let Some(close) = body.find(BLOCK_CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        let source = unescape_html(&strip_tags(&body[..close]));
        out.push_str(&render_code_block(&tokenizer, &source));
        decorated += 1;
        rest = &body[close + BLOCK_CLOSE.len()..];
    }
    out.push_str(rest);
    (out, decorated)
}

/// Offset of the `>` closing a `<code>` tag whose text starts inside the
/// double-quoted `class` value.
fn open_tag_end(tag: &str) -> Option<usize> {
    let mut quote = Some('"');
    for (i, c) in tag.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// The text content of an HTML fragment: every `<...>` span removed.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decorate the code blocks inside element `scope`.
///
/// # Errors
///
/// [`PostProcessError::MissingScope`] if `scope` does not exist.
pub fn highlight_code<D: Document + ?Sized>(
    doc: &mut D,
    scope: &str,
) -> Result<usize, PostProcessError> {
    let html = doc
        .inner_html(scope)
        .ok_or_else(|| PostProcessError::MissingScope(scope.to_string()))?;
    let (decorated_html, count) = decorate_code_blocks(&html);
    if count > 0 {
        doc.set_inner_html(scope, &decorated_html)?;
    }
    Ok(count)
}

/// Highlight then typeset `scope`, logging failures.
pub fn finish_rich_content<D: Document + ?Sized>(doc: &mut D, scope: &str) {
    match highlight_code(doc, scope) {
        Ok(count) => debug!(scope, blocks = count, "highlighted code"),
        Err(err) => warn!(scope, error = %err, "code highlighting failed"),
    }
    typeset_best_effort(doc, scope);
}

/// Typeset `scope`, logging a failure.
pub fn typeset_best_effort<D: Document + ?Sized>(doc: &mut D, scope: &str) {
    if let Err(err) = doc.typeset(scope) {
        warn!(scope, error = %err, "math typesetting failed");
    }
}

/// Replace the content of `scope` and post-process it.
///
/// # Errors
///
/// [`DocumentError`] if `scope` does not exist. Post-processing failures are
/// only logged.
pub fn insert_rich_content<D: Document + ?Sized>(
    doc: &mut D,
    scope: &str,
    html: &str,
) -> Result<(), DocumentError> {
    doc.set_inner_html(scope, html)?;
    finish_rich_content(doc, scope);
    Ok(())
}
