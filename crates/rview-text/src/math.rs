#![forbid(unsafe_code)]

//! Math wrappers.
//!
//! LaTeX is never HTML-escaped: the page typesetter consumes the raw source
//! between `\(`/`\)` (inline) or `\[`/`\]` (display) delimiters.

const MATH_OPEN: &str = "<span class=\"mathjax-latex\">";
const MATH_CLOSE: &str = "</span>";

/// Wrap LaTeX for the typesetter, choosing display or inline form.
///
/// Empty (after trim) input renders to nothing. Input containing a newline
/// or a `\begin` environment renders as display math.
#[must_use]
pub fn wrap_latex(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.contains('\n') || trimmed.contains("\\begin") {
        display_math(trimmed)
    } else {
        inline_math(trimmed)
    }
}

/// Wrap as display math unconditionally. Empty input renders to nothing.
#[must_use]
pub fn wrap_display(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    display_math(trimmed)
}

fn display_math(latex: &str) -> String {
    format!("{MATH_OPEN}\\[{latex}\\]{MATH_CLOSE}")
}

fn inline_math(latex: &str) -> String {
    format!("{MATH_OPEN}\\({latex}\\){MATH_CLOSE}")
}
