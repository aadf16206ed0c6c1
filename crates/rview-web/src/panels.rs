#![forbid(unsafe_code)]

//! Expands a problem's model record into the panel HTML of one category.
//!
//! Every category shares the header and the code, answer and final sections.
//! They differ in the reasoning sections, which [`SectionSet`] selects:
//!
//! - `Standard`: preview reasoning with a full-trace view
//! - `SoftInterrupt`: reasoning before the interrupt, then interrupt + later
//! - `UpdateDriven`: shared pre-update reasoning in the header, an update
//!   block per panel, then post-update reasoning

use rview_core::{CategoryConfig, Model, Problem, SectionSet, Stage, StageKind};
use rview_text::{ContentValue, count_characters, escape_attr, escape_text};

use crate::affordance::{Affordance, AffordanceList, ContentKind};

/// Shown in place of the panels when a problem has no model record.
pub const NO_MODEL_HTML: &str =
    "<div class=\"empty-state\">No model data available for this problem.</div>";

/// Shown in an update block when no update applies to the stage.
pub const NO_UPDATE_HTML: &str = "<p class=\"update-placeholder\">No update provided.</p>";

/// Panel markup plus the full-view entry points it contains, in button order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedPanels {
    pub html: String,
    pub affordances: Vec<Affordance>,
}

/// Render the panels for `problem` in `config`'s category.
#[must_use]
pub fn render_panels(problem: &Problem, config: &CategoryConfig) -> RenderedPanels {
    let Some(model) = problem.model.as_ref() else {
        return RenderedPanels {
            html: NO_MODEL_HTML.to_string(),
            affordances: Vec::new(),
        };
    };

    let mut list = AffordanceList::default();
    let mut html = String::new();

    if let Some(takeaway) = model.takeaway.as_deref() {
        html.push_str("<div class=\"model-takeaway-standalone\">");
        html.push_str(&escape_text(takeaway));
        html.push_str("</div>");
    }

    match config.section_set {
        SectionSet::UpdateDriven => {
            let shared = shared_before_update(model, &mut list);
            html.push_str("<div class=\"model-header\"><div class=\"model-heading\">");
            html.push_str(&logo_html(model));
            html.push_str("<h2>");
            html.push_str(&heading_html(model));
            html.push_str("</h2></div>");
            html.push_str(shared.as_deref().unwrap_or_default());
            html.push_str("</div>");
        }
        SectionSet::Standard | SectionSet::SoftInterrupt => {
            html.push_str("<div class=\"model-header\">");
            html.push_str(&logo_html(model));
            html.push_str("<div class=\"model-title-section\"><h2>");
            html.push_str(&heading_html(model));
            html.push_str("</h2></div></div>");
        }
    }

    let layout = config.layout_for(model);
    let has_shared = shared_sources(model).0.is_some();
    html.push_str("<div class=\"model-panels ");
    html.push_str(layout.css_class());
    html.push_str("\">");
    for &kind in layout.stages() {
        let stage = model.stage(kind);
        let label = stage
            .label
            .as_deref()
            .unwrap_or_else(|| config.stage_label(kind));
        html.push_str("<section class=\"panel\"><h3>");
        html.push_str(&escape_text(label));
        html.push_str("</h3>");
        let mut panel = Panel {
            stage,
            kind,
            label,
            list: &mut list,
            out: &mut html,
        };
        match config.section_set {
            SectionSet::Standard => panel.standard(),
            SectionSet::SoftInterrupt => panel.soft_interrupt(),
            SectionSet::UpdateDriven => panel.update_driven(problem.update_for(kind), has_shared),
        }
        html.push_str("</section>");
    }
    html.push_str("</div>");

    RenderedPanels {
        html,
        affordances: list.into_vec(),
    }
}

fn heading_html(model: &Model) -> String {
    let name = escape_text(model.display_name());
    match model.link() {
        Some(link) => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{name}</a>",
            escape_attr(link)
        ),
        None => name,
    }
}

fn logo_html(model: &Model) -> String {
    model
        .logo
        .as_deref()
        .map(|logo| {
            format!(
                "<img src=\"{}\" alt=\"{} logo\">",
                escape_attr(logo),
                escape_attr(model.display_name())
            )
        })
        .unwrap_or_default()
}

/// `<p class="{class}">{text}: N CHARACTERS</p>`, or nothing for zero.
fn count_label(class: &str, text: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    format!("<p class=\"{class}\">{text}: {count} CHARACTERS</p>")
}

fn count_of(content: Option<&ContentValue>) -> usize {
    content.map_or(0, ContentValue::char_count)
}

fn rendered(content: Option<&ContentValue>) -> String {
    content.map(ContentValue::render).unwrap_or_default()
}

/// The preview and full-text sources of the shared pre-update reasoning.
fn shared_sources(model: &Model) -> (Option<&ContentValue>, Option<&ContentValue>) {
    let oracle = model.stage(StageKind::Oracle);
    let interrupt = model.stage(StageKind::Interrupt);
    let preview = model
        .shared_pre_reason
        .as_ref()
        .or(oracle.pre_interrupt_reason.as_ref())
        .or(interrupt.pre_interrupt_reason.as_ref());
    let full = model
        .shared_pre_full_reason
        .as_ref()
        .or(oracle.pre_interrupt_full_reason.as_ref())
        .or(interrupt.pre_interrupt_full_reason.as_ref());
    // A full text alone still makes the section exist; its preview is the
    // full text.
    (preview.or(full), full)
}

fn shared_before_update(model: &Model, list: &mut AffordanceList) -> Option<String> {
    let (preview, full) = shared_sources(model);
    let preview = preview?;
    let preview_html = preview.render();
    let full_html = full.map_or_else(|| preview_html.clone(), ContentValue::render);
    let count = full.unwrap_or(preview).char_count();
    let button = list.button(Affordance::new(
        ContentKind::Reasoning,
        "Reasoning (Before Update)",
        full_html,
    ));
    Some(format!(
        "<div class=\"content-container shared-reasoning\">{}{button}<div class=\"reasoning-answer intervene-pre limited\">{preview_html}</div></div>",
        count_label("reasoning-line-count", "Reasoning (Before Update)", count),
    ))
}

// ---------------------------------------------------------------------------
// Panel sections
// ---------------------------------------------------------------------------

struct Panel<'a> {
    stage: &'a Stage,
    kind: StageKind,
    label: &'a str,
    list: &'a mut AffordanceList,
    out: &'a mut String,
}

impl Panel<'_> {
    fn reasoning_label(&self) -> &'static str {
        match self.kind {
            StageKind::Oracle => "Reasoning Section",
            StageKind::Interrupt => "Reasoning (Update + Post Interrupt)",
        }
    }

    /// A reasoning container: count label, full-view button, preview.
    fn reasoning_block(
        &mut self,
        container_class: &str,
        count_label_html: &str,
        title: String,
        full_html: String,
        preview_class: &str,
        preview_html: &str,
    ) {
        let button = self
            .list
            .button(Affordance::new(ContentKind::Reasoning, title, full_html));
        self.out.push_str(&format!(
            "<div class=\"{container_class}\">{count_label_html}{button}<div class=\"{preview_class}\">{preview_html}</div></div>"
        ));
    }

    fn standard(&mut self) {
        let stage = self.stage;
        if let Some(preview) = stage.preview_reason.as_ref() {
            let count = count_label(
                "reasoning-line-count",
                self.reasoning_label(),
                count_of(stage.full_reasoning_trace.as_ref()),
            );
            self.reasoning_block(
                "content-container",
                &count,
                format!("Reasoning - {}", self.label),
                rendered(stage.full_reasoning_trace.as_ref()),
                "reasoning-answer limited",
                &preview.render(),
            );
        }
        self.code();
        self.answer();
        self.final_answer();
    }

    fn soft_interrupt(&mut self) {
        let stage = self.stage;
        if let Some(pre) = stage.pre_interrupt_reason.as_ref() {
            let count = count_label(
                "reasoning-line-count",
                "Reasoning (Pre-Interrupt)",
                count_of(stage.pre_interrupt_full_reason.as_ref()),
            );
            self.reasoning_block(
                "content-container reasoning-pre",
                &count,
                format!("Reasoning (Pre-Interrupt) - {}", self.label),
                rendered(stage.pre_interrupt_full_reason.as_ref()),
                "reasoning-answer speedup-pre",
                &pre.render(),
            );
        }
        if let Some(later) = stage.interrupt_later_reason.as_ref() {
            let count = count_label(
                "reasoning-line-count",
                "Reasoning (Interrupt + Later)",
                count_of(stage.interrupt_later_full_reason.as_ref()),
            );
            self.reasoning_block(
                "content-container reasoning-post",
                &count,
                format!("Reasoning (Interrupt + Later) - {}", self.label),
                rendered(stage.interrupt_later_full_reason.as_ref()),
                "reasoning-answer speedup-post",
                &later.render(),
            );
        }
        self.code();
        self.answer();
        self.final_answer();
    }

    fn update_driven(&mut self, update: Option<&ContentValue>, has_shared: bool) {
        let stage = self.stage;
        let soft = stage.has_soft_interrupt_structure();

        if (!soft || !has_shared)
            && let Some(preview) = stage.preview_reason.as_ref()
        {
            let count = count_label(
                "reasoning-line-count",
                self.reasoning_label(),
                count_of(stage.full_reasoning_trace.as_ref()),
            );
            let preview_class = match self.kind {
                StageKind::Oracle => "reasoning-answer limited",
                StageKind::Interrupt => "reasoning-answer intervene-post limited",
            };
            self.reasoning_block(
                "content-container",
                &count,
                format!("{} - {}", self.reasoning_label(), self.label),
                rendered(stage.full_reasoning_trace.as_ref()),
                preview_class,
                &preview.render(),
            );
        }

        if soft
            && !has_shared
            && let Some(pre) = stage.pre_interrupt_reason.as_ref()
        {
            let full = stage.pre_interrupt_full_reason.as_ref();
            let count = count_label(
                "reasoning-line-count",
                "Reasoning (Before Update)",
                full.unwrap_or(pre).char_count(),
            );
            let preview_html = pre.render();
            self.reasoning_block(
                "content-container reasoning-pre",
                &count,
                format!("Reasoning (Before Update) - {}", self.label),
                full.map_or_else(|| preview_html.clone(), ContentValue::render),
                "reasoning-answer intervene-pre limited",
                &preview_html,
            );
        }

        self.update_block(update);

        if soft && let Some(later) = stage.interrupt_later_reason.as_ref() {
            let full = stage.interrupt_later_full_reason.as_ref();
            let count = count_label(
                "reasoning-line-count",
                "Reasoning (Update + Post Interrupt)",
                full.unwrap_or(later).char_count(),
            );
            let preview_html = later.render();
            self.reasoning_block(
                "content-container reasoning-post",
                &count,
                format!("Reasoning (Update + Post Interrupt) - {}", self.label),
                full.map_or_else(|| preview_html.clone(), ContentValue::render),
                "reasoning-answer intervene-post limited",
                &preview_html,
            );
        }

        self.answer();
        self.code();
        self.final_answer();
    }

    fn update_block(&mut self, update: Option<&ContentValue>) {
        let body = update.map_or_else(|| NO_UPDATE_HTML.to_string(), ContentValue::render);
        self.out.push_str(&format!(
            "<div class=\"content-container update-block\"><h3 class=\"update-heading\">Update</h3>{}<div class=\"reasoning-answer intervene-pre limited\">{body}</div></div>",
            count_label("answer-line-count", "Update Section", count_of(update)),
        ));
    }

    fn code(&mut self) {
        let Some(code) = self.stage.code.as_deref() else {
            return;
        };
        let button = self.list.button(Affordance::new(
            ContentKind::Code,
            format!("Code - {}", self.label),
            code,
        ));
        self.out.push_str(&format!(
            "<div class=\"content-container\">{}{button}<pre class=\"code-block\"><code class=\"language-python\">{}</code></pre></div>",
            count_label("answer-line-count", "Answer section", count_characters(code)),
            escape_text(code),
        ));
    }

    fn answer(&mut self) {
        let Some(answer) = self.stage.answer.as_ref() else {
            return;
        };
        let html = answer.render();
        let button = self.list.button(Affordance::new(
            ContentKind::Math,
            format!("Math Answer - {}", self.label),
            html.clone(),
        ));
        self.out.push_str(&format!(
            "<div class=\"content-container\">{}{button}<div class=\"math-answer\">{html}</div></div>",
            count_label("answer-line-count", "Answer section", answer.char_count()),
        ));
    }

    fn final_answer(&mut self) {
        let Some(final_answer) = self.stage.final_answer.as_ref() else {
            return;
        };
        let html = final_answer.render();
        let button = self.list.button(Affordance::new(
            ContentKind::Final,
            format!("Final Answer - {}", self.label),
            html.clone(),
        ));
        self.out.push_str(&format!(
            "<div class=\"content-container\">{button}<div class=\"final-answer\">{html}</div></div>"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rview_core::{Category, Payload};

    fn problem(json: &str) -> Problem {
        let payload: Payload = serde_json::from_str(&format!("{{\"problems\": [{json}]}}")).unwrap();
        payload.problems.into_iter().next().unwrap()
    }

    fn panel_count(html: &str) -> usize {
        html.matches("<section class=\"panel\">").count()
    }

    // =========================================================================
    // Shared structure
    // =========================================================================

    #[test]
    fn missing_model_is_empty_state() {
        let rendered = render_panels(&problem(r#"{"question": "Q"}"#), &Category::Leakage.config());
        assert_eq!(rendered.html, NO_MODEL_HTML);
        assert!(rendered.affordances.is_empty());
    }

    #[test]
    fn header_escapes_and_links() {
        let p = problem(
            r#"{"model": {"name": "A<B", "url": "https://x.test/?a=1&b=2", "logo": "l.png", "takeaway": "t & u"}}"#,
        );
        let html = render_panels(&p, &Category::Default.config()).html;
        assert!(html.starts_with("<div class=\"model-takeaway-standalone\">t &amp; u</div>"));
        assert!(html.contains("<img src=\"l.png\" alt=\"A&lt;B logo\">"));
        assert!(html.contains(
            "<a href=\"https://x.test/?a=1&amp;b=2\" target=\"_blank\" rel=\"noopener\">A&lt;B</a>"
        ));
    }

    #[test]
    fn default_model_name() {
        let html = render_panels(&problem(r#"{"model": {}}"#), &Category::Leakage.config()).html;
        assert!(html.contains("<h2>Model</h2>"));
    }

    #[test]
    fn single_default_category_renders_one_panel() {
        let p = problem(r#"{"model": {"oracle": {"answer": "42"}}}"#);
        let html = render_panels(&p, &Category::Panic.config()).html;
        assert!(html.contains("<div class=\"model-panels single-column\">"));
        assert_eq!(panel_count(&html), 1);
    }

    #[test]
    fn two_column_uses_category_labels() {
        let p = problem(r#"{"model": {"oracle": {}, "interrupt": {"label": "Mine"}}}"#);
        let html = render_panels(&p, &Category::Leakage.config()).html;
        assert_eq!(panel_count(&html), 2);
        assert!(html.contains("<h3>Full Thinking</h3>"));
        assert!(html.contains("<h3>Mine</h3>"));
    }

    #[test]
    fn labels_are_escaped_everywhere() {
        let p = problem(r#"{"model": {"layout": "single", "oracle": {"label": "<x>", "code": "1"}}}"#);
        let rendered = render_panels(&p, &Category::Leakage.config());
        assert!(rendered.html.contains("<h3>&lt;x&gt;</h3>"));
        assert!(rendered.html.contains("data-title=\"Code - &lt;x&gt;\""));
        assert_eq!(rendered.affordances[0].title, "Code - <x>");
    }

    // =========================================================================
    // Standard sections
    // =========================================================================

    #[test]
    fn standard_section_order_and_affordances() {
        let p = problem(
            r#"{"model": {"layout": "single", "oracle": {
                "preview_reason": "short",
                "full_reasoning_trace": "long trace",
                "code": "x = 1",
                "answer": "**7**",
                "final": "done"
            }}}"#,
        );
        let rendered = render_panels(&p, &Category::Default.config());
        let kinds: Vec<_> = rendered.affordances.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            [ContentKind::Reasoning, ContentKind::Code, ContentKind::Math, ContentKind::Final]
        );
        assert_eq!(rendered.affordances[0].title, "Reasoning - Full Thinking");
        assert_eq!(rendered.affordances[0].content, "long trace");
        assert_eq!(rendered.affordances[1].content, "x = 1");
        assert_eq!(rendered.affordances[2].content, "<strong>7</strong>");
        assert!(rendered.html.contains(
            "<p class=\"reasoning-line-count\">Reasoning Section: 10 CHARACTERS</p>"
        ));
        assert!(rendered.html.contains("<p class=\"answer-line-count\">Answer section: 5 CHARACTERS</p>"));
        assert!(rendered.html.contains("<div class=\"reasoning-answer limited\">short</div>"));
        assert!(rendered.html.contains("<div class=\"final-answer\">done</div>"));
    }

    #[test]
    fn code_is_escaped_raw() {
        let p = problem(r#"{"model": {"layout": "single", "oracle": {"code": "if a < b: **x**"}}}"#);
        let html = render_panels(&p, &Category::Default.config()).html;
        assert!(html.contains(
            "<pre class=\"code-block\"><code class=\"language-python\">if a &lt; b: **x**</code></pre>"
        ));
    }

    #[test]
    fn zero_counts_have_no_label() {
        let p = problem(r#"{"model": {"layout": "single", "oracle": {"preview_reason": "p"}}}"#);
        let html = render_panels(&p, &Category::Leakage.config()).html;
        assert!(!html.contains("CHARACTERS"));
    }

    #[test]
    fn numeric_answer_counts_its_digits() {
        let p = problem(r#"{"model": {"layout": "single", "oracle": {"answer": 12}}}"#);
        let rendered = render_panels(&p, &Category::Default.config());
        assert!(rendered.html.contains(
            "<p class=\"answer-line-count\">Answer section: 2 CHARACTERS</p>"
        ));
        assert!(rendered.html.contains("<div class=\"math-answer\"></div>"));
        assert_eq!(rendered.affordances[0].content, "");
    }

    // =========================================================================
    // Soft interrupt
    // =========================================================================

    #[test]
    fn soft_interrupt_sections() {
        let p = problem(
            r#"{"model": {"oracle": {
                "pre_interrupt_reason": "before",
                "pre_interrupt_full_reason": "before, fully",
                "interrupt_later_reason": "after",
                "code": "pass"
            }}}"#,
        );
        let rendered = render_panels(&p, &Category::Panic.config());
        let html = &rendered.html;
        assert!(html.contains("Reasoning (Pre-Interrupt): 13 CHARACTERS"));
        assert!(html.contains("<div class=\"reasoning-answer speedup-pre\">before</div>"));
        assert!(html.contains("<div class=\"reasoning-answer speedup-post\">after</div>"));
        assert!(!html.contains("Reasoning (Interrupt + Later): "));
        assert_eq!(rendered.affordances[0].title, "Reasoning (Pre-Interrupt) - Full Thinking");
        assert_eq!(rendered.affordances[1].content, "");
        assert_eq!(rendered.affordances[2].kind, ContentKind::Code);
    }

    // =========================================================================
    // Update driven
    // =========================================================================

    #[test]
    fn shared_reasoning_sits_in_header() {
        let p = problem(
            r#"{"model": {
                "oracle": {"pre_interrupt_reason": "shared", "interrupt_later_reason": "later"},
                "interrupt": {"interrupt_later_reason": "later 2"}
            }}"#,
        );
        let rendered = render_panels(&p, &Category::Doubt.config());
        let html = &rendered.html;
        let header_end = html.find("<div class=\"model-panels").unwrap();
        let shared = html.find("shared-reasoning").unwrap();
        assert!(shared < header_end);
        assert!(html.contains("Reasoning (Before Update): 6 CHARACTERS"));
        assert!(!html.contains("reasoning-pre"));
        assert_eq!(rendered.affordances[0].title, "Reasoning (Before Update)");
        assert_eq!(panel_count(html), 2);
        assert_eq!(html.matches(NO_UPDATE_HTML).count(), 2);
    }

    #[test]
    fn update_blocks_follow_precedence() {
        let p = problem(
            r#"{
                "updates": ["from list", "right from list"],
                "update_left": "record left",
                "model": {"interrupt": {}, "update_right": "model right"}
            }"#,
        );
        let html = render_panels(&p, &Category::Doubt.config()).html;
        let left = html.find("record left").unwrap();
        let right = html.find("model right").unwrap();
        assert!(left < right);
        assert!(!html.contains("from list"));
        assert!(html.contains("Update Section: 11 CHARACTERS"));
    }

    #[test]
    fn update_driven_order() {
        let p = problem(
            r#"{"model": {"layout": "single", "oracle": {
                "interrupt_later_reason": "later",
                "answer": "a",
                "code": "c",
                "final": "f"
            }}}"#,
        );
        let rendered = render_panels(&p, &Category::Doubt.config());
        let html = &rendered.html;
        let update = html.find("update-block").unwrap();
        let later = html.find("reasoning-post").unwrap();
        let answer = html.find("math-answer").unwrap();
        let code = html.find("code-block").unwrap();
        let fin = html.find("final-answer").unwrap();
        assert!(update < later && later < answer && answer < code && code < fin);
        assert_eq!(
            rendered.affordances[0].title,
            "Reasoning (Update + Post Interrupt) - Full Thinking"
        );
        assert_eq!(rendered.affordances[0].content, "later");
    }

    #[test]
    fn plain_reasoning_shows_without_soft_structure() {
        let p = problem(
            r#"{"model": {"oracle": {"preview_reason": "p1"}, "interrupt": {"preview_reason": "p2"}}}"#,
        );
        let rendered = render_panels(&p, &Category::Doubt.config());
        assert!(rendered.html.contains("<div class=\"reasoning-answer limited\">p1</div>"));
        assert!(rendered
            .html
            .contains("<div class=\"reasoning-answer intervene-post limited\">p2</div>"));
        assert_eq!(
            rendered.affordances[1].title,
            "Reasoning (Update + Post Interrupt) - Intervene @0.3"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let p = problem(
            r#"{"model": {"oracle": {"preview_reason": "$x$", "code": "a"}, "interrupt": {"answer": "b"}}}"#,
        );
        for category in Category::ALL {
            let config = category.config();
            assert_eq!(render_panels(&p, &config), render_panels(&p, &config));
        }
    }
}
