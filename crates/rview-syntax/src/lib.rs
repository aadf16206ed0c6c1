#![forbid(unsafe_code)]

//! Code highlighting for rview.
//!
//! A line-based tokenizer engine ([`tokenizer`]), its Python configuration
//! ([`python`]), and HTML output with `hljs-*` spans and a line-number gutter
//! ([`html`]).
//!
//! # Example
//! ```
//! use rview_syntax::{python_tokenizer, render_code_block};
//!
//! let html = render_code_block(&python_tokenizer(), "def f():\n    return 1\n");
//! assert!(html.contains("<span class=\"hljs-title function_\">f</span>"));
//! assert!(html.contains("<span>2</span>"));
//! ```

pub mod html;
pub mod python;
pub mod tokenizer;

pub use html::{LINE_NUMBERS_ATTR, count_lines, highlight_html, line_numbers_html, render_code_block};
pub use python::python_tokenizer;
pub use tokenizer::{
    GenericTokenizer, GenericTokenizerConfig, LineState, Quote, Token, TokenKind, Tokenizer,
};
