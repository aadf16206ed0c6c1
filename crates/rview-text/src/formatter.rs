#![forbid(unsafe_code)]

//! Restricted markup formatting.
//!
//! The corpus uses a small subset of Markdown/LaTeX. This module tokenizes
//! that subset in a single left-to-right scan and renders the tokens to HTML.
//!
//! # Syntax
//!
//! Patterns are tried in this order at every position:
//! - ```` ```lang\n...``` ```` - fenced code block (`latex`/`math`/`tex` render as math)
//! - `**text**` - bold, may contain further inline markup
//! - `$$...$$` - display math
//! - `$...$` - inline math
//! - `` `code` `` - inline code (`` `latex: x^2` `` renders as math)
//!
//! ## Escaping
//! - `\$` - literal `$` (applies to both math forms)
//!
//! Unterminated constructs are not errors: an unclosed fence flushes the rest
//! of the input as text, any other unclosed opener is a literal character.
//!
//! # Example
//! ```
//! use rview_text::formatter::{Token, tokenize};
//!
//! let tokens = tokenize("Use `x = 1` then **done**");
//! assert_eq!(tokens[1], Token::InlineCode("x = 1"));
//! assert_eq!(tokens[3], Token::Bold("done"));
//! ```

use crate::escape::{escape_attr_into, escape_text_into};
use crate::math::{wrap_display, wrap_latex};

const FENCE: &str = "```";
const BOLD: &str = "**";
const MATH_BLOCK: &str = "$$";

/// A lexical unit of the markup dialect.
///
/// Everything except [`Token::Text`] borrows from the input. Text is owned
/// because escaped dollars drop their backslash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text, escaped on render.
    Text(String),
    /// `**...**`
    Bold(&'a str),
    /// `` `...` ``
    InlineCode(&'a str),
    /// ```` ```lang ... ``` ````
    CodeBlock { lang: &'a str, content: &'a str },
    /// `$...$`
    MathInline(&'a str),
    /// `$$...$$`
    MathBlock(&'a str),
}

/// Tokenize markup input.
///
/// Never fails; arbitrary input yields a token stream.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let bytes = input.as_bytes();
    let mut idx = 0;

    while idx < input.len() {
        let rest = &input[idx..];

        if rest.starts_with(FENCE) {
            let Some(close) = find_from(input, FENCE, idx + FENCE.len()) else {
                buffer.push_str(rest);
                break;
            };
            flush(&mut tokens, &mut buffer);

            let open_end = idx + FENCE.len();
            let (lang, content_start) = match find_from(input, "\n", open_end) {
                Some(newline) if newline < close => (input[open_end..newline].trim(), newline + 1),
                _ => ("", open_end),
            };
            tokens.push(Token::CodeBlock {
                lang,
                content: &input[content_start..close],
            });
            idx = close + FENCE.len();
            continue;
        }

        if rest.starts_with(BOLD) {
            match find_from(input, BOLD, idx + BOLD.len()) {
                Some(close) => {
                    flush(&mut tokens, &mut buffer);
                    tokens.push(Token::Bold(&input[idx + BOLD.len()..close]));
                    idx = close + BOLD.len();
                }
                None => {
                    buffer.push('*');
                    idx += 1;
                }
            }
            continue;
        }

        if rest.starts_with(MATH_BLOCK) {
            if is_escaped(bytes, idx) {
                push_escaped_dollar(&mut buffer);
                idx += 1;
                continue;
            }
            match find_from(input, MATH_BLOCK, idx + MATH_BLOCK.len()) {
                Some(close) => {
                    flush(&mut tokens, &mut buffer);
                    tokens.push(Token::MathBlock(&input[idx + MATH_BLOCK.len()..close]));
                    idx = close + MATH_BLOCK.len();
                }
                None => {
                    buffer.push('$');
                    idx += 1;
                }
            }
            continue;
        }

        if bytes[idx] == b'$' {
            if is_escaped(bytes, idx) {
                push_escaped_dollar(&mut buffer);
                idx += 1;
                continue;
            }
            match find_from(input, "$", idx + 1) {
                Some(close) => {
                    flush(&mut tokens, &mut buffer);
                    tokens.push(Token::MathInline(&input[idx + 1..close]));
                    idx = close + 1;
                }
                None => {
                    buffer.push('$');
                    idx += 1;
                }
            }
            continue;
        }

        if bytes[idx] == b'`' {
            match find_from(input, "`", idx + 1) {
                Some(close) => {
                    flush(&mut tokens, &mut buffer);
                    tokens.push(Token::InlineCode(&input[idx + 1..close]));
                    idx = close + 1;
                }
                None => {
                    buffer.push('`');
                    idx += 1;
                }
            }
            continue;
        }

        // Markers are ASCII, so `idx` always sits on a char boundary here.
        let Some(ch) = rest.chars().next() else {
            break;
        };
        buffer.push(ch);
        idx += ch.len_utf8();
    }

    flush(&mut tokens, &mut buffer);
    tokens
}

/// Render a token stream to HTML.
#[must_use]
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for token in tokens {
        render_token_into(&mut out, token);
    }
    out
}

/// Tokenize and render in one step.
#[must_use]
pub fn format_plain_text(input: &str) -> String {
    render(&tokenize(input))
}

fn render_token_into(out: &mut String, token: &Token<'_>) {
    match token {
        Token::Text(text) => {
            let start = out.len();
            escape_text_into(out, text);
            if out[start..].contains('\n') {
                let rendered = out.split_off(start).replace('\n', "<br>");
                out.push_str(&rendered);
            }
        }
        Token::Bold(inner) => {
            out.push_str("<strong>");
            out.push_str(&format_plain_text(inner));
            out.push_str("</strong>");
        }
        Token::InlineCode(code) => match strip_latex_prefix(code.trim()) {
            Some(latex) => out.push_str(&wrap_latex(latex)),
            None => {
                out.push_str("<code class=\"inline-code\">");
                escape_text_into(out, code);
                out.push_str("</code>");
            }
        },
        Token::CodeBlock { lang, content } => {
            let lang = lang.trim().to_lowercase();
            if matches!(lang.as_str(), "latex" | "math" | "tex") {
                out.push_str(&wrap_latex(content.trim()));
                return;
            }
            out.push_str("<pre class=\"code-block\"><code class=\"");
            if lang.is_empty() {
                out.push_str("language-plaintext");
            } else {
                out.push_str("language-");
                escape_attr_into(out, &lang);
            }
            out.push_str("\">");
            escape_text_into(out, content);
            out.push_str("</code></pre>");
        }
        Token::MathInline(latex) => out.push_str(&wrap_latex(latex)),
        Token::MathBlock(latex) => out.push_str(&wrap_display(latex)),
    }
}

/// Recognize the `` `latex: ...` `` escape hatch used by some authors.
///
/// Matches `latex` (any case) followed by `:` or whitespace and returns the
/// remainder with the separator run removed.
fn strip_latex_prefix(trimmed: &str) -> Option<&str> {
    let head = trimmed.get(..5)?;
    if !head.eq_ignore_ascii_case("latex") {
        return None;
    }
    let rest = &trimmed[5..];
    let sep = rest.chars().next()?;
    if sep != ':' && !sep.is_whitespace() {
        return None;
    }
    Some(rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace()))
}

fn find_from(haystack: &str, pattern: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .find(pattern)
        .map(|pos| pos + from)
}

fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    idx > 0 && bytes[idx - 1] == b'\\'
}

/// The backslash preceding an escaped `$` is already buffered; replace it.
fn push_escaped_dollar(buffer: &mut String) {
    if buffer.ends_with('\\') {
        buffer.pop();
    }
    buffer.push('$');
}

fn flush<'a>(tokens: &mut Vec<Token<'a>>, buffer: &mut String) {
    if !buffer.is_empty() {
        tokens.push(Token::Text(std::mem::take(buffer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Token<'static> {
        Token::Text(s.to_string())
    }

    // =========================================================================
    // Tokenizer
    // =========================================================================

    #[test]
    fn tokenize_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_plain_text() {
        assert_eq!(tokenize("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn tokenize_mixed_inline() {
        assert_eq!(
            tokenize("Use `x = 1` then **done**"),
            vec![
                text("Use "),
                Token::InlineCode("x = 1"),
                text(" then "),
                Token::Bold("done"),
            ]
        );
    }

    #[test]
    fn tokenize_fenced_block_with_lang() {
        assert_eq!(
            tokenize("before\n```python\nprint(1)\n```after"),
            vec![
                text("before\n"),
                Token::CodeBlock {
                    lang: "python",
                    content: "print(1)\n",
                },
                text("after"),
            ]
        );
    }

    #[test]
    fn tokenize_fenced_block_without_newline_has_no_lang() {
        assert_eq!(
            tokenize("```x = 1```"),
            vec![Token::CodeBlock {
                lang: "",
                content: "x = 1",
            }]
        );
    }

    #[test]
    fn tokenize_fence_lang_is_trimmed() {
        let tokens = tokenize("```  rust  \nfn main() {}```");
        assert_eq!(
            tokens,
            vec![Token::CodeBlock {
                lang: "rust",
                content: "fn main() {}",
            }]
        );
    }

    #[test]
    fn tokenize_unterminated_fence_flushes_rest_as_text() {
        assert_eq!(
            tokenize("a ```py\n**x** $y$"),
            vec![text("a ```py\n**x** $y$")]
        );
    }

    #[test]
    fn tokenize_fence_wins_over_inline_code() {
        let tokens = tokenize("```\n`a`\n```");
        assert_eq!(
            tokens,
            vec![Token::CodeBlock {
                lang: "",
                content: "`a`\n",
            }]
        );
    }

    #[test]
    fn tokenize_unclosed_bold_is_literal() {
        assert_eq!(
            tokenize("**bold without close"),
            vec![text("**bold without close")]
        );
    }

    #[test]
    fn tokenize_math_forms() {
        assert_eq!(
            tokenize("$$x^2$$ and $y$"),
            vec![
                Token::MathBlock("x^2"),
                text(" and "),
                Token::MathInline("y"),
            ]
        );
    }

    #[test]
    fn tokenize_escaped_dollars_stay_text() {
        assert_eq!(tokenize("\\$5 and \\$10"), vec![text("$5 and $10")]);
    }

    #[test]
    fn tokenize_escaped_block_dollar() {
        let tokens = tokenize("cost \\$$ here");
        assert_eq!(tokens, vec![text("cost $$ here")]);
    }

    #[test]
    fn tokenize_unclosed_dollar_is_literal() {
        assert_eq!(tokenize("costs $5"), vec![text("costs $5")]);
    }

    #[test]
    fn tokenize_unclosed_backtick_is_literal() {
        assert_eq!(tokenize("a ` b"), vec![text("a ` b")]);
    }

    #[test]
    fn tokenize_multibyte_text() {
        assert_eq!(
            tokenize("naïve → **ok** ✓"),
            vec![text("naïve → "), Token::Bold("ok"), text(" ✓")]
        );
    }

    // =========================================================================
    // Renderer
    // =========================================================================

    #[test]
    fn render_scenario_inline_code_and_bold() {
        let html = format_plain_text("Use `x = 1` then **done**");
        assert_eq!(
            html,
            "Use <code class=\"inline-code\">x = 1</code> then <strong>done</strong>"
        );
    }

    #[test]
    fn render_text_escapes_and_breaks_lines() {
        assert_eq!(format_plain_text("a < b\nc & d"), "a &lt; b<br>c &amp; d");
    }

    #[test]
    fn render_unclosed_bold_keeps_asterisks() {
        let html = format_plain_text("**bold without close");
        assert!(html.contains("**bold without close"));
    }

    #[test]
    fn render_bold_formats_inner_markup() {
        assert_eq!(
            format_plain_text("**see `f(x)` & $x$**"),
            "<strong>see <code class=\"inline-code\">f(x)</code> &amp; \
             <span class=\"mathjax-latex\">\\(x\\)</span></strong>"
        );
    }

    #[test]
    fn render_inline_code_is_escaped() {
        assert_eq!(
            format_plain_text("`<div>`"),
            "<code class=\"inline-code\">&lt;div&gt;</code>"
        );
    }

    #[test]
    fn render_inline_latex_escape_hatch() {
        assert_eq!(
            format_plain_text("`LaTeX: \\frac{1}{2}`"),
            "<span class=\"mathjax-latex\">\\(\\frac{1}{2}\\)</span>"
        );
        assert_eq!(
            format_plain_text("` latex x+y `"),
            "<span class=\"mathjax-latex\">\\(x+y\\)</span>"
        );
    }

    #[test]
    fn render_latexy_identifier_is_code() {
        assert_eq!(
            format_plain_text("`latexmk`"),
            "<code class=\"inline-code\">latexmk</code>"
        );
    }

    #[test]
    fn render_code_block_with_language() {
        assert_eq!(
            format_plain_text("```Python\nif a < b:\n    pass\n```"),
            "<pre class=\"code-block\"><code class=\"language-python\">\
             if a &lt; b:\n    pass\n</code></pre>"
        );
    }

    #[test]
    fn render_code_block_defaults_to_plaintext() {
        assert_eq!(
            format_plain_text("```\nraw\n```"),
            "<pre class=\"code-block\"><code class=\"language-plaintext\">raw\n</code></pre>"
        );
    }

    #[test]
    fn render_math_fence_as_math() {
        for lang in ["latex", "math", "TeX"] {
            let html = format_plain_text(&format!("```{lang}\nx^2\n```"));
            assert_eq!(html, "<span class=\"mathjax-latex\">\\(x^2\\)</span>");
        }
    }

    #[test]
    fn render_math_block_is_always_display() {
        assert_eq!(
            format_plain_text("$$ x $$"),
            "<span class=\"mathjax-latex\">\\[x\\]</span>"
        );
    }

    #[test]
    fn render_empty_math_renders_nothing() {
        assert_eq!(format_plain_text("a$ $b$$  $$c"), "abc");
    }

    #[test]
    fn render_math_is_not_escaped() {
        assert_eq!(
            format_plain_text("$a < b$"),
            "<span class=\"mathjax-latex\">\\(a < b\\)</span>"
        );
    }
}
