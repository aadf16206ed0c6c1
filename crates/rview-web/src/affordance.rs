#![forbid(unsafe_code)]

//! "Open full view" buttons and the data they carry.

use std::fmt;

use rview_text::escape_attr;

/// What a full view shows, which decides how the modal renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Reasoning,
    Code,
    Math,
    Final,
    Question,
}

impl ContentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Code => "code",
            Self::Math => "math",
            Self::Final => "final",
            Self::Question => "question",
        }
    }

    /// Parse a `data-type` value. Unknown names render as HTML, like
    /// reasoning.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "code" => Self::Code,
            "math" => Self::Math,
            "final" => Self::Final,
            "question" => Self::Question,
            _ => Self::Reasoning,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full-view entry point: the modal title and the unencoded content.
///
/// For [`ContentKind::Code`] the content is raw source. Otherwise it is
/// rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub kind: ContentKind,
    pub title: String,
    pub content: String,
}

impl Affordance {
    #[must_use]
    pub fn new(kind: ContentKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: content.into(),
        }
    }

    /// The button markup. `index` is the affordance's position in the list
    /// returned alongside the HTML.
    #[must_use]
    pub fn button_html(&self, index: usize) -> String {
        format!(
            "<button class=\"view-separate-btn\" data-index=\"{index}\" data-content=\"{}\" data-type=\"{}\" data-title=\"{}\">Open full view</button>",
            urlencoding::encode(&self.content),
            self.kind,
            escape_attr(&self.title),
        )
    }
}

/// Collects affordances while a view is built and hands out their buttons.
#[derive(Debug, Default)]
pub(crate) struct AffordanceList {
    items: Vec<Affordance>,
}

impl AffordanceList {
    /// Register an affordance and return its button.
    pub(crate) fn button(&mut self, affordance: Affordance) -> String {
        let html = affordance.button_html(self.items.len());
        self.items.push(affordance);
        html
    }

    pub(crate) fn into_vec(self) -> Vec<Affordance> {
        self.items
    }
}
