#![forbid(unsafe_code)]

//! Page rendering for rview.
//!
//! The embedding host owns the DOM and the event loop. This crate turns
//! problems into markup and keeps per-category state:
//! - [`document`] - the host interface and an in-memory implementation
//! - [`panels`] / [`question`] - markup for a problem
//! - [`postprocess`] - code highlighting and math typesetting after insertion
//! - [`modal`] - the full-view dialog
//! - [`viewer`] - the controller the host feeds events into

pub mod affordance;
pub mod document;
pub mod modal;
pub mod panels;
pub mod postprocess;
pub mod question;
pub mod viewer;

pub use affordance::{Affordance, ContentKind};
pub use document::{Document, DocumentError, MemoryDocument};
pub use modal::{ClickTarget, DetailModal, ModalError};
pub use panels::{NO_MODEL_HTML, NO_UPDATE_HTML, RenderedPanels, render_panels};
pub use postprocess::{PostProcessError, decorate_code_blocks, highlight_code};
pub use question::{FrameIds, Placeholder, QuestionView, render_question};
pub use viewer::{CategoryView, Viewer, ViewerError, ViewerEvent};
