#![forbid(unsafe_code)]

//! The full-view dialog of a category.

use std::fmt;
use std::string::FromUtf8Error;

use rview_core::CategoryConfig;
use rview_text::escape_text;
use tracing::{debug, warn};

use crate::affordance::{Affordance, ContentKind};
use crate::document::{Document, DocumentError};
use crate::postprocess::{highlight_code, typeset_best_effort};

const MODAL_OPEN_CLASS: &str = "modal-open";

/// Failure to show a full view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// `data-content` is not valid percent-encoded UTF-8.
    Decode(FromUtf8Error),
    Document(DocumentError),
}

impl fmt::Display for ModalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "cannot decode full-view content: {err}"),
            Self::Document(err) => write!(f, "cannot show full view: {err}"),
        }
    }
}

impl std::error::Error for ModalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Document(err) => Some(err),
        }
    }
}

impl From<DocumentError> for ModalError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

/// Where a click on an open modal landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// The dimmed area around the content box.
    Backdrop,
    /// Anywhere inside the content box.
    Content,
}

/// One category's full-view dialog.
///
/// The markup is appended to the body the first time the dialog is shown and
/// reused afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailModal {
    wrapper_class: &'static str,
    modal_id: String,
    title_id: String,
    body_id: String,
    created: bool,
    open: bool,
}

impl DetailModal {
    #[must_use]
    pub fn new(config: &CategoryConfig) -> Self {
        Self {
            wrapper_class: config.wrapper_class,
            modal_id: config.id("separate-view-modal"),
            title_id: config.id("modal-title"),
            body_id: config.id("modal-body"),
            created: false,
            open: false,
        }
    }

    #[must_use]
    pub fn modal_id(&self) -> &str {
        &self.modal_id
    }

    #[must_use]
    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    #[must_use]
    pub fn body_id(&self) -> &str {
        &self.body_id
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_created<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<(), DocumentError> {
        if self.created && doc.has_element(&self.modal_id) {
            return Ok(());
        }
        doc.append_to_body(&format!(
            "<div id=\"{}\" class=\"{} modal\"><div class=\"modal-content\"><span class=\"modal-close\">&times;</span><div class=\"modal-header\"><h2 id=\"{}\"></h2></div><div id=\"{}\"></div></div></div>",
            self.modal_id, self.wrapper_class, self.title_id, self.body_id
        ));
        doc.set_visible(&self.modal_id, false)?;
        self.created = true;
        debug!(modal = %self.modal_id, "created full-view modal");
        Ok(())
    }

    /// Show unencoded content.
    ///
    /// Code is escaped into a Python block and highlighted; anything else is
    /// inserted as HTML and typeset.
    ///
    /// # Errors
    ///
    /// [`ModalError::Document`] if the host lost the modal's elements.
    pub fn show<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        content: &str,
        kind: ContentKind,
        title: &str,
    ) -> Result<(), ModalError> {
        self.ensure_created(doc)?;
        doc.set_text(&self.title_id, title)?;
        match kind {
            ContentKind::Code => {
                doc.set_inner_html(
                    &self.body_id,
                    &format!(
                        "<pre class=\"code-block\"><code class=\"language-python\">{}</code></pre>",
                        escape_text(content)
                    ),
                )?;
                if let Err(err) = highlight_code(doc, &self.body_id) {
                    warn!(modal = %self.modal_id, error = %err, "code highlighting failed");
                }
            }
            ContentKind::Reasoning | ContentKind::Math | ContentKind::Final | ContentKind::Question => {
                doc.set_inner_html(&self.body_id, content)?;
                typeset_best_effort(doc, &self.body_id);
            }
        }
        doc.reset_scroll(&self.body_id)?;
        doc.set_visible(&self.modal_id, true)?;
        doc.set_body_class(MODAL_OPEN_CLASS, true);
        self.open = true;
        Ok(())
    }

    /// Show percent-encoded content, as carried by a button's `data-content`.
    ///
    /// # Errors
    ///
    /// [`ModalError::Decode`] if the content does not decode; the modal is
    /// left as it was.
    pub fn show_encoded<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        encoded: &str,
        kind: ContentKind,
        title: &str,
    ) -> Result<(), ModalError> {
        let content = urlencoding::decode(encoded).map_err(ModalError::Decode)?;
        self.show(doc, &content, kind, title)
    }

    /// Show an affordance returned by the panel renderer.
    ///
    /// # Errors
    ///
    /// See [`DetailModal::show`].
    pub fn show_affordance<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        affordance: &Affordance,
    ) -> Result<(), ModalError> {
        self.show(doc, &affordance.content, affordance.kind, &affordance.title)
    }

    /// Hide the dialog. No-op when it is not open.
    pub fn close<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if !self.open {
            return;
        }
        if let Err(err) = doc.set_visible(&self.modal_id, false) {
            warn!(modal = %self.modal_id, error = %err, "cannot hide modal");
        }
        doc.set_body_class(MODAL_OPEN_CLASS, false);
        self.open = false;
    }

    /// Close on a backdrop click; clicks inside the content box do nothing.
    pub fn click<D: Document + ?Sized>(&mut self, doc: &mut D, target: ClickTarget) {
        if target == ClickTarget::Backdrop {
            self.close(doc);
        }
    }
}
