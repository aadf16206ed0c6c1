#![forbid(unsafe_code)]

//! Content values and their normalization.
//!
//! Records in the corpus carry rich content in two shapes: a bare string, or
//! an object `{ "format": "text" | "latex" | "html", "value": ... }`. Both are
//! reconciled into [`ContentValue`] once, at ingestion, so the renderers only
//! ever see one shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::formatter::format_plain_text;
use crate::math::wrap_latex;

/// How a content value is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Restricted markup, rendered by the formatter.
    #[default]
    Text,
    /// Raw LaTeX handed to the typesetter.
    Latex,
    /// Trusted HTML, inserted verbatim.
    Html,
}

impl ContentFormat {
    /// Parse a format name. Unknown names fall back to [`ContentFormat::Text`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "latex" => Self::Latex,
            "html" => Self::Html,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Latex => "latex",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical rich content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawContent")]
pub struct ContentValue {
    pub format: ContentFormat,
    pub value: String,
    /// UTF-16 length of the field as written in the input, before
    /// normalization replaced non-string scalars.
    #[serde(skip_serializing)]
    source_chars: usize,
}

impl ContentValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ContentFormat::Text, value)
    }

    #[must_use]
    pub fn new(format: ContentFormat, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            format,
            source_chars: count_characters(&value),
            value,
        }
    }

    /// Normalize a record field with no fallback, keeping the character
    /// count of its unwrapped source string.
    ///
    /// `12` normalizes to empty text but still counts two characters.
    #[must_use]
    pub fn from_field(raw: &RawContent) -> Option<Self> {
        let mut content = normalize(Some(raw), "")?;
        content.source_chars = count_characters(&content_string(Some(raw), ""));
        Some(content)
    }

    /// True when there is nothing to render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Render to HTML. See [`render_rich`].
    #[must_use]
    pub fn render(&self) -> String {
        render_rich(self)
    }

    /// Character count of the unrendered source field.
    #[must_use]
    pub const fn char_count(&self) -> usize {
        self.source_chars
    }
}

impl From<RawContent> for ContentValue {
    fn from(raw: RawContent) -> Self {
        Self::from_field(&raw).unwrap_or_default()
    }
}

/// Content exactly as it appeared in the input JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RawContent {
    /// A bare string.
    Text(String),
    /// A JSON object; only `format` and `value` are consulted.
    Object {
        format: Option<String>,
        value: Option<Value>,
    },
    /// Any other JSON value.
    Other(Value),
}

impl RawContent {
    /// Whether the field counts as present: non-null and not an empty string.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Object { .. } => true,
            Self::Other(value) => !value.is_null(),
        }
    }
}

impl From<Value> for RawContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Object(mut map) => Self::Object {
                format: match map.remove("format") {
                    Some(Value::String(s)) => Some(s),
                    _ => None,
                },
                value: map.remove("value").filter(|v| !v.is_null()),
            },
            other => Self::Other(other),
        }
    }
}

/// Reconcile raw content into a [`ContentValue`].
///
/// Absent (or empty-string) content with an empty fallback yields `None`.
/// Objects take their `format` (default text) and `value` (default
/// `fallback`); any other shape becomes text holding `fallback`.
#[must_use]
pub fn normalize(content: Option<&RawContent>, fallback: &str) -> Option<ContentValue> {
    let present = content.is_some_and(RawContent::is_present);
    if !present && fallback.is_empty() {
        return None;
    }
    let normalized = match content {
        Some(RawContent::Text(s)) => ContentValue::text(s.as_str()),
        Some(RawContent::Object { format, value }) => ContentValue::new(
            format
                .as_deref()
                .map(ContentFormat::parse)
                .unwrap_or_default(),
            value
                .as_ref()
                .map_or_else(|| fallback.to_string(), stringify),
        ),
        Some(RawContent::Other(_)) | None => ContentValue::text(fallback),
    };
    Some(normalized)
}

/// Unwrap raw content to a plain string for character counting.
///
/// Never renders markup.
#[must_use]
pub fn content_string(raw: Option<&RawContent>, fallback: &str) -> String {
    match raw {
        None => fallback.to_string(),
        Some(RawContent::Text(s)) => s.clone(),
        Some(RawContent::Object { value, .. }) => value
            .as_ref()
            .map_or_else(|| fallback.to_string(), stringify),
        Some(RawContent::Other(Value::Null)) => fallback.to_string(),
        Some(RawContent::Other(Value::Array(_))) => fallback.to_string(),
        Some(RawContent::Other(value)) => stringify(value),
    }
}

/// Number of UTF-16 code units in `s`, the unit page scripts count in.
#[must_use]
pub fn count_characters(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Render content to HTML.
///
/// Empty values render to nothing. HTML content is trusted and inserted
/// verbatim.
#[must_use]
pub fn render_rich(content: &ContentValue) -> String {
    if content.value.is_empty() {
        return String::new();
    }
    match content.format {
        ContentFormat::Latex => wrap_latex(&content.value),
        ContentFormat::Html => content.value.clone(),
        ContentFormat::Text => format_plain_text(&content.value),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
