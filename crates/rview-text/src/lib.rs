#![forbid(unsafe_code)]

//! Text handling for rview.
//!
//! This crate turns the restricted markup dialect used by the problem corpus
//! into HTML:
//! - [`formatter`] - tokenizer and token renderer (bold, code, math)
//! - [`math`] - wrappers that hand raw LaTeX to the page typesetter
//! - [`escape`] - text and attribute escaping
//! - [`content`] - the [`ContentValue`] model and its normalizer
//!
//! # Example
//! ```
//! use rview_text::format_plain_text;
//!
//! let html = format_plain_text("Use `x = 1` then **done**");
//! assert!(html.contains("<code class=\"inline-code\">x = 1</code>"));
//! assert!(html.contains("<strong>done</strong>"));
//! ```

pub mod content;
pub mod escape;
pub mod formatter;
pub mod math;

pub use content::{
    ContentFormat, ContentValue, RawContent, content_string, count_characters, normalize,
    render_rich,
};
pub use escape::{escape_attr, escape_text, unescape_html};
pub use formatter::{Token, format_plain_text, render, tokenize};
pub use math::wrap_latex;
