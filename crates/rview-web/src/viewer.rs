#![forbid(unsafe_code)]

//! Host-driven controller for every category on a page.
//!
//! The host owns the event loop. It loads data, then feeds user actions in as
//! [`ViewerEvent`]s. The viewer mutates its stores and redraws the affected
//! category into the [`Document`]. Nothing here blocks, and fetches are the
//! only suspension points.

use std::fmt;

use futures::future::join_all;
use rview_core::{
    Category, CategoryConfig, LoadError, LoadState, Payload, ProblemSource, ProblemStore,
};
use tracing::{debug, warn};

use crate::affordance::{Affordance, ContentKind};
use crate::document::{Document, DocumentError};
use crate::modal::{ClickTarget, DetailModal, ModalError};
use crate::panels::render_panels;
use crate::postprocess::{insert_rich_content, typeset_best_effort};
use crate::question::{FrameIds, Placeholder, render_question};

/// A user action, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Next(Category),
    Previous(Category),
    /// A panel's "Open full view" button, by `data-index`.
    OpenFullView { category: Category, index: usize },
    /// The question's "View Full Problem" button.
    OpenQuestion(Category),
    /// A full-view button read straight from the DOM.
    OpenEncoded {
        category: Category,
        kind: ContentKind,
        title: String,
        content: String,
    },
    CloseModal,
    ModalClick(ClickTarget),
}

/// Failure to act on a [`ViewerEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// The category is not part of this viewer.
    UnknownCategory(Category),
    /// No full view with that index is currently rendered.
    NoSuchAffordance { category: Category, index: usize },
    /// The current question has no content to show.
    NoQuestionContent(Category),
    Modal(ModalError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory(category) => write!(f, "category {category} is not shown"),
            Self::NoSuchAffordance { category, index } => {
                write!(f, "no full view #{index} in category {category}")
            }
            Self::NoQuestionContent(category) => {
                write!(f, "the current {category} question has no content")
            }
            Self::Modal(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Modal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModalError> for ViewerError {
    fn from(err: ModalError) -> Self {
        Self::Modal(err)
    }
}

/// One category's state: its data, its dialog and what is on screen.
#[derive(Debug, Clone)]
pub struct CategoryView {
    config: CategoryConfig,
    store: ProblemStore,
    modal: DetailModal,
    affordances: Vec<Affordance>,
    question: Option<Affordance>,
}

impl CategoryView {
    #[must_use]
    pub fn new(config: CategoryConfig) -> Self {
        Self {
            modal: DetailModal::new(&config),
            config,
            store: ProblemStore::new(),
            affordances: Vec::new(),
            question: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ProblemStore {
        &self.store
    }

    #[must_use]
    pub fn modal(&self) -> &DetailModal {
        &self.modal
    }

    /// Full views of the panels currently rendered, by `data-index`.
    #[must_use]
    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    #[must_use]
    pub fn question_view(&self) -> Option<&Affordance> {
        self.question.as_ref()
    }
}

/// Drives the categories of one page.
#[derive(Debug)]
pub struct Viewer<D: Document> {
    document: D,
    views: Vec<CategoryView>,
    active_modal: Option<Category>,
}

impl<D: Document> Viewer<D> {
    /// A viewer over all four categories.
    #[must_use]
    pub fn new(document: D) -> Self {
        Self::with_categories(document, &Category::ALL)
    }

    /// A viewer over `categories`, in the given order. Duplicates are ignored.
    #[must_use]
    pub fn with_categories(document: D, categories: &[Category]) -> Self {
        let mut views: Vec<CategoryView> = Vec::with_capacity(categories.len());
        for &category in categories {
            if !views.iter().any(|v| v.config.category == category) {
                views.push(CategoryView::new(category.config()));
            }
        }
        Self {
            document,
            views,
            active_modal: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    #[must_use]
    pub fn into_document(self) -> D {
        self.document
    }

    #[must_use]
    pub fn view(&self, category: Category) -> Option<&CategoryView> {
        self.views.iter().find(|v| v.config.category == category)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.views.iter().map(|v| v.config.category).collect()
    }

    /// The category whose dialog is open.
    #[must_use]
    pub const fn active_modal(&self) -> Option<Category> {
        self.active_modal
    }

    fn index_of(&self, category: Category) -> Result<usize, ViewerError> {
        self.views
            .iter()
            .position(|v| v.config.category == category)
            .ok_or(ViewerError::UnknownCategory(category))
    }

    fn has_container(&self, index: usize) -> bool {
        self.document.has_element(self.views[index].config.container_id)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Start loading a category and show the loading placeholder.
    ///
    /// Returns `false` when the category's container is not on the page; the
    /// category is then left alone.
    ///
    /// # Errors
    ///
    /// [`LoadError::AlreadyLoading`] if a load for the category is in flight.
    pub fn begin_load(&mut self, category: Category) -> Result<bool, LoadError> {
        let Ok(index) = self.index_of(category) else {
            return Ok(false);
        };
        if !self.has_container(index) {
            debug!(%category, "container missing, skipping");
            return Ok(false);
        }
        self.views[index].store.begin_load()?;
        self.redraw(index);
        Ok(true)
    }

    /// Apply a fetch result and draw the outcome.
    pub fn finish_load(&mut self, category: Category, result: Result<Payload, LoadError>) {
        let Ok(index) = self.index_of(category) else {
            return;
        };
        if self.views[index].store.apply(result).is_err() {
            debug!(%category, "category failed to load");
        }
        self.redraw(index);
    }

    /// Load every category with a container, fetching concurrently.
    ///
    /// Results are applied in category order once all fetches finish.
    pub async fn load_all(&mut self, source: &dyn ProblemSource) {
        let mut pending = Vec::new();
        for category in self.categories() {
            match self.begin_load(category) {
                Ok(true) => pending.push(category),
                Ok(false) => {}
                Err(err) => warn!(%category, error = %err, "load not started"),
            }
        }
        let fetches = pending
            .iter()
            .map(|category| source.fetch(category.config().resource_path));
        let results = join_all(fetches).await;
        for (category, result) in pending.into_iter().zip(results) {
            self.finish_load(category, result);
        }
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Draw a category from its current state.
    pub fn render(&mut self, category: Category) {
        if let Ok(index) = self.index_of(category) {
            self.redraw(index);
        }
    }

    fn redraw(&mut self, index: usize) {
        if !self.has_container(index) {
            return;
        }
        let view = &mut self.views[index];
        let config = view.config;
        view.affordances.clear();
        view.question = None;

        let placeholder = match view.store.state() {
            LoadState::Idle => return,
            LoadState::Loading => Some(Placeholder::Loading),
            LoadState::Failed => Some(Placeholder::Failed),
            LoadState::Loaded if view.store.is_empty() => Some(Placeholder::Empty),
            LoadState::Loaded => None,
        };
        if let Some(placeholder) = placeholder {
            self.set_container(index, &placeholder.html(&config));
            return;
        }
        let Some(problem) = view.store.current() else {
            return;
        };

        debug!(category = %config.category, cursor = view.store.cursor(), "rendering problem");
        let frame = render_question(&problem.question, &config);
        let panels = render_panels(problem, &config);
        view.affordances = panels.affordances;
        view.question = frame.full_view;

        self.set_container(index, &frame.html);
        let ids = FrameIds::new(&config);
        if let Err(err) = insert_rich_content(&mut self.document, &ids.panels, &panels.html) {
            warn!(category = %config.category, error = %err, "cannot fill panels");
        }
        if self.document.has_element(&ids.details) {
            typeset_best_effort(&mut self.document, &ids.details);
        }
    }

    fn set_container(&mut self, index: usize, html: &str) {
        let container = self.views[index].config.container_id;
        if let Err(err) = self.document.set_inner_html(container, html) {
            report_document_error(container, &err);
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Show the next problem, wrapping. No-op when the category is empty.
    pub fn next(&mut self, category: Category) {
        self.step(category, ProblemStore::next);
    }

    /// Show the previous problem, wrapping. No-op when the category is empty.
    pub fn previous(&mut self, category: Category) {
        self.step(category, ProblemStore::previous);
    }

    fn step(&mut self, category: Category, move_cursor: fn(&mut ProblemStore)) {
        let Ok(index) = self.index_of(category) else {
            return;
        };
        if self.views[index].store.is_empty() {
            return;
        }
        move_cursor(&mut self.views[index].store);
        self.redraw(index);
    }

    // -----------------------------------------------------------------------
    // Full views
    // -----------------------------------------------------------------------

    /// Open the full view of the panel button numbered `index`.
    ///
    /// # Errors
    ///
    /// [`ViewerError::NoSuchAffordance`] for an index that is not rendered,
    /// or a [`ModalError`].
    pub fn open_full_view(&mut self, category: Category, index: usize) -> Result<(), ViewerError> {
        let view_index = self.index_of(category)?;
        let affordance = self.views[view_index]
            .affordances
            .get(index)
            .cloned()
            .ok_or(ViewerError::NoSuchAffordance { category, index })?;
        self.open_modal(view_index, |modal, doc| modal.show_affordance(doc, &affordance))
    }

    /// Open the current question in full.
    ///
    /// # Errors
    ///
    /// [`ViewerError::NoQuestionContent`] when the question is empty, or a
    /// [`ModalError`].
    pub fn open_question(&mut self, category: Category) -> Result<(), ViewerError> {
        let view_index = self.index_of(category)?;
        let affordance = self.views[view_index]
            .question
            .clone()
            .ok_or(ViewerError::NoQuestionContent(category))?;
        self.open_modal(view_index, |modal, doc| modal.show_affordance(doc, &affordance))
    }

    /// Open percent-encoded content taken from a button's data attributes.
    ///
    /// # Errors
    ///
    /// [`ModalError::Decode`] if the content does not decode.
    pub fn open_encoded(
        &mut self,
        category: Category,
        kind: ContentKind,
        title: &str,
        content: &str,
    ) -> Result<(), ViewerError> {
        let view_index = self.index_of(category)?;
        self.open_modal(view_index, |modal, doc| {
            modal.show_encoded(doc, content, kind, title)
        })
    }

    /// Only one dialog is open at a time; opening another closes the first.
    fn open_modal(
        &mut self,
        view_index: usize,
        show: impl FnOnce(&mut DetailModal, &mut D) -> Result<(), ModalError>,
    ) -> Result<(), ViewerError> {
        let category = self.views[view_index].config.category;
        if let Some(active) = self.active_modal
            && active != category
        {
            self.close_modal();
        }
        let view = &mut self.views[view_index];
        match show(&mut view.modal, &mut self.document) {
            Ok(()) => {
                self.active_modal = Some(category);
                Ok(())
            }
            Err(err) => {
                warn!(%category, error = %err, "cannot open full view");
                Err(err.into())
            }
        }
    }

    /// Close the open dialog, if any.
    pub fn close_modal(&mut self) {
        let Some(active) = self.active_modal.take() else {
            return;
        };
        if let Some(view) = self.views.iter_mut().find(|v| v.config.category == active) {
            view.modal.close(&mut self.document);
        }
    }

    /// A click on the open dialog; only the backdrop closes it.
    pub fn backdrop_click(&mut self, target: ClickTarget) {
        if target == ClickTarget::Backdrop {
            self.close_modal();
        }
    }

    /// Dispatch a host event.
    ///
    /// # Errors
    ///
    /// Whatever the dispatched operation returns.
    pub fn handle(&mut self, event: ViewerEvent) -> Result<(), ViewerError> {
        match event {
            ViewerEvent::Next(category) => self.next(category),
            ViewerEvent::Previous(category) => self.previous(category),
            ViewerEvent::OpenFullView { category, index } => {
                self.open_full_view(category, index)?;
            }
            ViewerEvent::OpenQuestion(category) => self.open_question(category)?,
            ViewerEvent::OpenEncoded {
                category,
                kind,
                title,
                content,
            } => self.open_encoded(category, kind, &title, &content)?,
            ViewerEvent::CloseModal => self.close_modal(),
            ViewerEvent::ModalClick(target) => self.backdrop_click(target),
        }
        Ok(())
    }
}

fn report_document_error(id: &str, err: &DocumentError) {
    warn!(element = id, error = %err, "document update failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct Fixture(HashMap<&'static str, Result<&'static str, u16>>);

    #[async_trait]
    impl ProblemSource for Fixture {
        async fn fetch(&self, path: &str) -> Result<Payload, LoadError> {
            match self.0.get(path) {
                Some(Ok(json)) => Ok(serde_json::from_str(json)?),
                Some(Err(status)) => Err(LoadError::Status(*status)),
                None => Err(LoadError::Status(404)),
            }
        }
    }

    const THREE: &str = r#"{"problems": [
        {"question": "First", "model": {"oracle": {"code": "a = 1", "answer": "one"}}},
        {"question": "Second", "model": {"oracle": {"answer": "two"}}},
        {"question": "Third"}
    ]}"#;

    fn page() -> MemoryDocument {
        MemoryDocument::with_containers(Category::ALL.iter().map(|c| c.config().container_id))
    }

    fn loaded(json: &'static str) -> Viewer<MemoryDocument> {
        let mut viewer = Viewer::with_categories(page(), &[Category::Panic]);
        viewer.begin_load(Category::Panic).unwrap();
        viewer.finish_load(Category::Panic, Ok(serde_json::from_str(json).unwrap()));
        viewer
    }

    fn container(viewer: &Viewer<MemoryDocument>, category: Category) -> String {
        viewer
            .document()
            .expanded_html(category.config().container_id)
            .unwrap()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn loading_placeholder_then_problem() {
        let mut viewer = Viewer::with_categories(page(), &[Category::Panic]);
        assert!(viewer.begin_load(Category::Panic).unwrap());
        assert!(container(&viewer, Category::Panic).contains("Loading problems…"));
        assert!(matches!(
            viewer.begin_load(Category::Panic),
            Err(LoadError::AlreadyLoading)
        ));
        viewer.finish_load(Category::Panic, Ok(serde_json::from_str(THREE).unwrap()));
        let html = container(&viewer, Category::Panic);
        assert!(html.contains("<h2 class=\"question-preview-title\">First</h2>"));
        assert!(html.contains("<div class=\"math-answer\">one</div>"));
        assert!(html.contains("data-line-numbers=\"true\""));
    }

    #[test]
    fn failure_shows_terminal_placeholder() {
        let mut viewer = Viewer::with_categories(page(), &[Category::Doubt]);
        viewer.begin_load(Category::Doubt).unwrap();
        viewer.finish_load(Category::Doubt, Err(LoadError::Status(500)));
        assert!(container(&viewer, Category::Doubt).contains("<h1>Failed to load examples.</h1>"));
        assert_eq!(
            viewer.view(Category::Doubt).unwrap().store().state(),
            LoadState::Failed
        );
    }

    #[test]
    fn failure_is_logged_as_error_once() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct ErrorCount(Arc<AtomicUsize>);

        impl<S: Subscriber> Layer<S> for ErrorCount {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == Level::ERROR {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCount(Arc::clone(&errors)));
        tracing::subscriber::with_default(subscriber, || {
            let mut viewer = Viewer::with_categories(page(), &[Category::Doubt]);
            viewer.begin_load(Category::Doubt).unwrap();
            viewer.finish_load(Category::Doubt, Err(LoadError::Status(500)));
        });
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_problems_and_noop_navigation() {
        let mut viewer = loaded(r#"{"problems": []}"#);
        let before = viewer.document().snapshot();
        assert!(before.contains("<h1>No problems available.</h1>"));
        viewer.handle(ViewerEvent::Next(Category::Panic)).unwrap();
        viewer.handle(ViewerEvent::Previous(Category::Panic)).unwrap();
        assert_eq!(viewer.document().snapshot(), before);
    }

    #[test]
    fn missing_container_is_skipped() {
        let doc = MemoryDocument::with_containers([Category::Leakage.config().container_id]);
        let mut viewer = Viewer::new(doc);
        assert!(!viewer.begin_load(Category::Doubt).unwrap());
        assert_eq!(
            viewer.view(Category::Doubt).unwrap().store().state(),
            LoadState::Idle
        );
        assert!(viewer.begin_load(Category::Leakage).unwrap());
    }

    #[tokio::test]
    async fn load_all_fills_every_present_category() {
        let source = Fixture(HashMap::from([
            ("./interactive_examples_data.json", Ok(THREE)),
            ("./examples_leakage.json", Ok(r#"{"problems": []}"#)),
            ("./examples_panic.json", Err(503)),
        ]));
        let doc = MemoryDocument::with_containers([
            Category::Default.config().container_id,
            Category::Leakage.config().container_id,
            Category::Panic.config().container_id,
        ]);
        let mut viewer = Viewer::new(doc);
        viewer.load_all(&source).await;
        assert!(container(&viewer, Category::Default).contains("First"));
        assert!(container(&viewer, Category::Leakage).contains("No problems available."));
        assert!(container(&viewer, Category::Panic).contains("Failed to load examples."));
        assert_eq!(
            viewer.view(Category::Doubt).unwrap().store().state(),
            LoadState::Idle
        );
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    #[test]
    fn navigation_wraps_and_redraws() {
        let mut viewer = loaded(THREE);
        viewer.previous(Category::Panic);
        assert!(container(&viewer, Category::Panic).contains("No model data available"));
        viewer.next(Category::Panic);
        assert!(container(&viewer, Category::Panic).contains("First"));
        viewer.next(Category::Panic);
        assert!(container(&viewer, Category::Panic).contains("Second"));
    }

    #[test]
    fn rendering_same_cursor_is_idempotent() {
        let mut viewer = loaded(THREE);
        let first = viewer.document().snapshot();
        viewer.render(Category::Panic);
        assert_eq!(viewer.document().snapshot(), first);
        for _ in 0..3 {
            viewer.next(Category::Panic);
        }
        assert_eq!(viewer.document().snapshot(), first);
    }

    #[test]
    fn single_default_category_shows_one_panel() {
        let viewer = loaded(THREE);
        assert_eq!(
            container(&viewer, Category::Panic)
                .matches("<section class=\"panel\">")
                .count(),
            1
        );
    }

    // =========================================================================
    // Full views
    // =========================================================================

    #[test]
    fn open_full_view_by_index() {
        let mut viewer = loaded(THREE);
        let view = viewer.view(Category::Panic).unwrap();
        assert_eq!(view.affordances().len(), 2);
        viewer
            .handle(ViewerEvent::OpenFullView {
                category: Category::Panic,
                index: 1,
            })
            .unwrap();
        assert_eq!(viewer.active_modal(), Some(Category::Panic));
        let doc = viewer.document();
        assert_eq!(doc.inner_html("modal-title-panic").unwrap(), "Math Answer - Full Thinking");
        assert_eq!(doc.inner_html("modal-body-panic").unwrap(), "one");
        assert!(doc.has_body_class("modal-open"));
    }

    #[test]
    fn unknown_index_is_an_error() {
        let mut viewer = loaded(THREE);
        assert_eq!(
            viewer.open_full_view(Category::Panic, 9),
            Err(ViewerError::NoSuchAffordance {
                category: Category::Panic,
                index: 9
            })
        );
        assert_eq!(viewer.active_modal(), None);
    }

    #[test]
    fn question_full_view() {
        let mut viewer = loaded(THREE);
        viewer.handle(ViewerEvent::OpenQuestion(Category::Panic)).unwrap();
        assert_eq!(
            viewer.document().inner_html("modal-title-panic").unwrap(),
            "Full context - First"
        );
    }

    #[test]
    fn backdrop_and_close() {
        let mut viewer = loaded(THREE);
        viewer.open_full_view(Category::Panic, 0).unwrap();
        viewer.handle(ViewerEvent::ModalClick(ClickTarget::Content)).unwrap();
        assert_eq!(viewer.active_modal(), Some(Category::Panic));
        viewer.handle(ViewerEvent::ModalClick(ClickTarget::Backdrop)).unwrap();
        assert_eq!(viewer.active_modal(), None);
        assert!(!viewer.document().has_body_class("modal-open"));
        viewer.open_full_view(Category::Panic, 0).unwrap();
        viewer.handle(ViewerEvent::CloseModal).unwrap();
        assert_eq!(viewer.document().is_visible("separate-view-modal-panic"), Some(false));
    }

    #[test]
    fn opening_another_category_closes_the_first() {
        let mut viewer = Viewer::with_categories(page(), &[Category::Panic, Category::Leakage]);
        for category in [Category::Panic, Category::Leakage] {
            viewer.begin_load(category).unwrap();
            viewer.finish_load(category, Ok(serde_json::from_str(THREE).unwrap()));
        }
        viewer.open_full_view(Category::Panic, 0).unwrap();
        viewer.open_full_view(Category::Leakage, 0).unwrap();
        assert_eq!(viewer.active_modal(), Some(Category::Leakage));
        let doc = viewer.document();
        assert_eq!(doc.is_visible("separate-view-modal-panic"), Some(false));
        assert_eq!(doc.is_visible("separate-view-modal-leakage"), Some(true));
        assert!(doc.has_body_class("modal-open"));
    }

    #[test]
    fn encoded_open_reports_decode_errors() {
        let mut viewer = loaded(THREE);
        let err = viewer
            .handle(ViewerEvent::OpenEncoded {
                category: Category::Panic,
                kind: ContentKind::Reasoning,
                title: "R".into(),
                content: "%C3%28".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ViewerError::Modal(ModalError::Decode(_))));
        assert_eq!(viewer.active_modal(), None);
    }
}
