#![forbid(unsafe_code)]

//! The per-category frame: heading, navigation buttons, the question preview
//! and the empty panels container.

use rview_core::{CategoryConfig, Question};
use rview_text::{escape_attr, escape_text};

use crate::affordance::{Affordance, ContentKind};

/// What a category shows before or instead of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Loading,
    Empty,
    Failed,
}

impl Placeholder {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Loading => "Loading problems…",
            Self::Empty => "No problems available.",
            Self::Failed => "Failed to load examples.",
        }
    }

    #[must_use]
    pub fn html(self, config: &CategoryConfig) -> String {
        format!(
            "<div class=\"{}\"><div class=\"wrapper\"><div class=\"header\"><h1>{}</h1></div></div></div>",
            config.wrapper_class,
            self.message()
        )
    }
}

/// Element ids of one category's frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIds {
    pub title: String,
    pub prev: String,
    pub next: String,
    pub details: String,
    pub panels: String,
}

impl FrameIds {
    #[must_use]
    pub fn new(config: &CategoryConfig) -> Self {
        Self {
            title: config.id("interactive-question-title"),
            prev: config.id("interactive-prev-problem"),
            next: config.id("interactive-next-problem"),
            details: config.id("interactive-question-details"),
            panels: config.id("interactive-panels-container"),
        }
    }
}

/// The frame markup and the question's full view, if it has content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub html: String,
    pub full_view: Option<Affordance>,
}

/// Build the frame for `question`. The panels container is left empty.
#[must_use]
pub fn render_question(question: &Question, config: &CategoryConfig) -> QuestionView {
    let ids = FrameIds::new(config);
    let content_html = question
        .content
        .as_ref()
        .map(|content| content.render())
        .unwrap_or_default();
    let title_html = match question.url.as_deref() {
        Some(url) => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
            escape_attr(url),
            escape_text(&question.title)
        ),
        None => escape_text(&question.title),
    };

    let html = format!(
        concat!(
            "<div class=\"{wrapper}\"><div class=\"wrapper\">",
            "<div class=\"header\"><h1 id=\"{title_id}\">{heading}</h1>",
            "<div class=\"header-actions\">",
            "<button id=\"{prev_id}\" title=\"Cycle through the previous problem\">◀ Previous</button>",
            "<button id=\"{next_id}\" title=\"Cycle through the next problem\">Next ▶</button>",
            "</div></div>",
            "<div class=\"question-details\" id=\"{details_id}\">",
            "<h2 class=\"question-preview-title\">{title_html}</h2>",
            "<div class=\"question-content\">{content_html}</div>",
            "<button class=\"view-full-context-btn\" data-type=\"question\" data-title=\"{title_pct}\" data-content=\"{content_pct}\">View Full Problem</button>",
            "</div>",
            "<div class=\"panels-container\" id=\"{panels_id}\"></div>",
            "</div></div>",
        ),
        wrapper = config.wrapper_class,
        title_id = ids.title,
        heading = escape_text(config.heading),
        prev_id = ids.prev,
        next_id = ids.next,
        details_id = ids.details,
        title_html = title_html,
        content_html = content_html,
        title_pct = urlencoding::encode(&question.title),
        content_pct = urlencoding::encode(&content_html),
        panels_id = ids.panels,
    );

    let full_view = (!content_html.is_empty()).then(|| {
        Affordance::new(
            ContentKind::Question,
            format!("Full context - {}", question.title),
            content_html,
        )
    });
    QuestionView { html, full_view }
}
