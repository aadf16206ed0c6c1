#![forbid(unsafe_code)]

//! HTML output: highlighted spans and the line-number gutter.

use rview_text::escape::escape_text_into;

use crate::tokenizer::Tokenizer;

/// Attribute marking a code block as already decorated.
pub const LINE_NUMBERS_ATTR: &str = "data-line-numbers";

/// Highlight `source` into escaped HTML with `hljs-*` spans.
///
/// Bytes not covered by a token (line terminators) are emitted escaped, so
/// the text content of the output always equals `source`.
#[must_use]
pub fn highlight_html(tokenizer: &dyn Tokenizer, source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let mut cursor = 0usize;

    for token in tokenizer.tokenize(source) {
        if token.range.start > cursor {
            escape_text_into(&mut out, &source[cursor..token.range.start]);
        }
        let text = token.text(source);
        match token.kind.css_class() {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                escape_text_into(&mut out, text);
                out.push_str("</span>");
            }
            None => escape_text_into(&mut out, text),
        }
        cursor = token.range.end;
    }
    if cursor < source.len() {
        escape_text_into(&mut out, &source[cursor..]);
    }

    out
}

/// Number of gutter lines for `text`.
///
/// CRLF counts as one terminator, a trailing newline does not open a new
/// line, and the result is at least 1.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    let normalized = text.replace("\r\n", "\n");
    let mut lines = normalized.split('\n').count();
    if normalized.ends_with('\n') {
        lines -= 1;
    }
    lines.max(1)
}

/// The gutter element with markers `1..=count`.
#[must_use]
pub fn line_numbers_html(count: usize) -> String {
    let mut out = String::from("<span class=\"line-numbers\" aria-hidden=\"true\">");
    for n in 1..=count {
        out.push_str("<span>");
        out.push_str(&n.to_string());
        out.push_str("</span>");
    }
    out.push_str("</span>");
    out
}

/// A complete decorated code block: gutter, highlighted body, and the
/// idempotence markers on both `pre` and `code`.
#[must_use]
pub fn render_code_block(tokenizer: &dyn Tokenizer, source: &str) -> String {
    let lang = tokenizer.name();
    format!(
        "<pre class=\"code-block\" {LINE_NUMBERS_ATTR}=\"true\">{gutter}\
         <code class=\"language-{lang} hljs\" {LINE_NUMBERS_ATTR}=\"true\">{body}</code></pre>",
        gutter = line_numbers_html(count_lines(source)),
        body = highlight_html(tokenizer, source),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::python_tokenizer;
    use pretty_assertions::assert_eq;

    #[test]
    fn highlight_wraps_styled_tokens() {
        let html = highlight_html(&python_tokenizer(), "if x < 1:\n    pass");
        assert_eq!(
            html,
            "<span class=\"hljs-keyword\">if</span> x &lt; <span class=\"hljs-number\">1</span>:\n    \
             <span class=\"hljs-keyword\">pass</span>"
        );
    }

    #[test]
    fn highlight_escapes_strings() {
        let html = highlight_html(&python_tokenizer(), "s = \"<b>&\"");
        assert!(html.contains("<span class=\"hljs-string\">\"&lt;b&gt;&amp;\"</span>"));
    }

    #[test]
    fn highlight_keeps_crlf() {
        let html = highlight_html(&python_tokenizer(), "a\r\nb");
        assert_eq!(html, "a\r\nb");
    }

    #[test]
    fn count_lines_rules() {
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\n"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\r\ntwo\r\n"), 2);
        assert_eq!(count_lines("\n\n"), 2);
    }

    #[test]
    fn gutter_markers() {
        assert_eq!(
            line_numbers_html(3),
            "<span class=\"line-numbers\" aria-hidden=\"true\">\
             <span>1</span><span>2</span><span>3</span></span>"
        );
    }

    #[test]
    fn code_block_is_marked() {
        let html = render_code_block(&python_tokenizer(), "x = 1\ny = 2\n");
        assert!(html.starts_with("<pre class=\"code-block\" data-line-numbers=\"true\">"));
        assert!(html.contains("<span>2</span></span><code class=\"language-python hljs\""));
        assert!(!html.contains("<span>3</span>"));
    }
}
