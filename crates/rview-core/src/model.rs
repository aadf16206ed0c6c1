#![forbid(unsafe_code)]

//! Problem records.
//!
//! Input JSON is hand-written and inconsistent, so every field is read
//! leniently: a value of the wrong JSON type is treated as absent instead of
//! failing the record or the payload. Content fields are normalized into
//! [`ContentValue`] here, once.

use serde::Deserialize;
use serde_json::Value;

use rview_text::{ContentValue, RawContent, normalize};

/// Title used when a problem has no usable question title.
pub const UNTITLED_PROBLEM: &str = "Untitled Problem";

/// Name used when a model record has no name.
pub const DEFAULT_MODEL_NAME: &str = "Model";

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{ContentValue, Layout, content_from};

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(super::string_from(Value::deserialize(d)?))
    }

    pub(super) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => Some(n.to_string()),
            other => super::string_from(other),
        })
    }

    pub(super) fn content<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<ContentValue>, D::Error> {
        Ok(content_from(Value::deserialize(d)?))
    }

    pub(super) fn contents<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Vec<Option<ContentValue>>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(items.into_iter().map(content_from).collect()),
            _ => None,
        })
    }

    pub(super) fn layout<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Layout>, D::Error> {
        Ok(super::string_from(Value::deserialize(d)?).map(|s| Layout::parse(&s)))
    }

    pub(super) fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }
}

fn string_from(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn content_from(value: Value) -> Option<ContentValue> {
    ContentValue::from_field(&RawContent::from(value))
}

// ---------------------------------------------------------------------------
// Layout and stages
// ---------------------------------------------------------------------------

/// Panel arrangement for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Oracle stage only.
    Single,
    /// Oracle and interrupt side by side.
    Two,
}

impl Layout {
    /// `"single"` is single column; any other name is two columns.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == "single" { Self::Single } else { Self::Two }
    }

    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Single => "single-column",
            Self::Two => "two-column",
        }
    }

    /// Stages shown for this layout, in panel order.
    #[must_use]
    pub const fn stages(self) -> &'static [StageKind] {
        match self {
            Self::Single => &[StageKind::Oracle],
            Self::Two => &[StageKind::Oracle, StageKind::Interrupt],
        }
    }
}

/// Which phase of a model's response a stage describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Oracle,
    Interrupt,
}

impl StageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Interrupt => "interrupt",
        }
    }
}

/// One phase of a model's response.
///
/// A field is present iff it was non-null and not an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Stage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub answer: Option<ContentValue>,
    /// Raw source code, never formatted.
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub preview_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub full_reasoning_trace: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub pre_interrupt_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub pre_interrupt_full_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub interrupt_later_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub interrupt_later_full_reason: Option<ContentValue>,
    #[serde(default, rename = "final", deserialize_with = "lenient::content")]
    pub final_answer: Option<ContentValue>,
}

static EMPTY_STAGE: Stage = Stage {
    label: None,
    answer: None,
    code: None,
    preview_reason: None,
    full_reasoning_trace: None,
    pre_interrupt_reason: None,
    pre_interrupt_full_reason: None,
    interrupt_later_reason: None,
    interrupt_later_full_reason: None,
    final_answer: None,
};

impl Stage {
    /// Whether the stage splits its reasoning around a soft interrupt.
    #[must_use]
    pub fn has_soft_interrupt_structure(&self) -> bool {
        self.pre_interrupt_reason.is_some()
            || self.pre_interrupt_full_reason.is_some()
            || self.interrupt_later_reason.is_some()
            || self.interrupt_later_full_reason.is_some()
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A model's response to a problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Model {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub href: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub takeaway: Option<String>,
    #[serde(default, deserialize_with = "lenient::layout")]
    pub layout: Option<Layout>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub oracle: Option<Stage>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub interrupt: Option<Stage>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub shared_pre_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub shared_pre_full_reason: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub update_left: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    pub update_right: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::contents")]
    pub updates: Option<Vec<Option<ContentValue>>>,
}

impl Model {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_MODEL_NAME)
    }

    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().or(self.href.as_deref())
    }

    /// The stage of the given kind; a missing stage reads as empty.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> &Stage {
        let stage = match kind {
            StageKind::Oracle => self.oracle.as_ref(),
            StageKind::Interrupt => self.interrupt.as_ref(),
        };
        stage.unwrap_or(&EMPTY_STAGE)
    }

    #[must_use]
    pub fn has_interrupt(&self) -> bool {
        self.interrupt.is_some()
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// The problem statement shown above the panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub title: String,
    pub content: Option<ContentValue>,
    pub url: Option<String>,
}

impl Default for Question {
    fn default() -> Self {
        Self {
            title: UNTITLED_PROBLEM.to_string(),
            content: None,
            url: None,
        }
    }
}

impl Question {
    /// Derive the question from a record's `question` value.
    ///
    /// `fallback_url` is the record-level `url`/`href`.
    #[must_use]
    pub fn extract(question: Option<&Value>, fallback_url: Option<String>) -> Self {
        match question {
            None | Some(Value::Null | Value::Bool(false)) => Self {
                url: fallback_url,
                ..Self::default()
            },
            Some(Value::String(s)) if s.is_empty() => Self {
                url: fallback_url,
                ..Self::default()
            },
            Some(Value::String(s)) => Self {
                title: s.clone(),
                content: Some(ContentValue::text(s.as_str())),
                url: fallback_url,
            },
            Some(Value::Object(map)) => {
                let title = map
                    .get("title")
                    .cloned()
                    .and_then(string_from)
                    .unwrap_or_else(|| UNTITLED_PROBLEM.to_string());
                let raw = map.get("content").cloned().map(RawContent::from);
                let content = normalize(raw.as_ref(), &title);
                let url = ["url", "href"]
                    .iter()
                    .find_map(|key| map.get(*key).cloned().and_then(string_from))
                    .or(fallback_url);
                Self { title, content, url }
            }
            Some(_) => Self {
                content: Some(ContentValue::text(UNTITLED_PROBLEM)),
                url: fallback_url,
                ..Self::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Problem
// ---------------------------------------------------------------------------

/// One record of the corpus. Immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawProblem")]
pub struct Problem {
    pub id: Option<String>,
    pub question: Question,
    pub model: Option<Model>,
    pub updates: Option<Vec<Option<ContentValue>>>,
    pub update_left: Option<ContentValue>,
    pub update_right: Option<ContentValue>,
}

#[derive(Deserialize)]
struct RawProblem {
    #[serde(default, deserialize_with = "lenient::id")]
    id: Option<String>,
    #[serde(default)]
    question: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    href: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    model: Option<Model>,
    #[serde(default, deserialize_with = "lenient::contents")]
    updates: Option<Vec<Option<ContentValue>>>,
    #[serde(default, deserialize_with = "lenient::content")]
    update_left: Option<ContentValue>,
    #[serde(default, deserialize_with = "lenient::content")]
    update_right: Option<ContentValue>,
}

impl From<RawProblem> for Problem {
    fn from(raw: RawProblem) -> Self {
        let fallback_url = raw.url.or(raw.href);
        Self {
            id: raw.id,
            question: Question::extract(raw.question.as_ref(), fallback_url),
            model: raw.model,
            updates: raw.updates,
            update_left: raw.update_left,
            update_right: raw.update_right,
        }
    }
}

impl Problem {
    /// The update shown in the oracle (left) or interrupt (right) panel.
    ///
    /// Model-level overrides win over record-level ones, which win over the
    /// `updates` list entry at index 0 or 1 (record list first, then model
    /// list).
    #[must_use]
    pub fn update_for(&self, kind: StageKind) -> Option<&ContentValue> {
        let model = self.model.as_ref();
        let (model_side, record_side, index) = match kind {
            StageKind::Oracle => (model.and_then(|m| m.update_left.as_ref()), &self.update_left, 0),
            StageKind::Interrupt => {
                (model.and_then(|m| m.update_right.as_ref()), &self.update_right, 1)
            }
        };
        let candidates = self
            .updates
            .as_ref()
            .or_else(|| model.and_then(|m| m.updates.as_ref()));
        model_side
            .or(record_side.as_ref())
            .or_else(|| candidates.and_then(|list| list.get(index)).and_then(Option::as_ref))
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A category's data file: `{ "problems": [...] }`.
///
/// A missing or non-list `problems` reads as empty; a non-object entry reads
/// as an empty record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct Payload {
    pub problems: Vec<Problem>,
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        let problems = match value {
            Value::Object(mut map) => match map.remove("problems") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
                        _ => Problem::default(),
                    })
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { problems }
    }
}
