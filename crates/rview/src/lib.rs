#![forbid(unsafe_code)]

//! rview public facade.
//!
//! Re-exports the types a host needs from the internal crates, plus the
//! static page renderer used by the `rview` binary.

pub mod cli;
pub mod page;

// --- Text re-exports -------------------------------------------------------

pub use rview_text::{
    ContentFormat, ContentValue, RawContent, escape_attr, escape_text, format_plain_text,
    render_rich, wrap_latex,
};

// --- Syntax re-exports -----------------------------------------------------

pub use rview_syntax::{Tokenizer, python_tokenizer, render_code_block};

// --- Core re-exports -------------------------------------------------------

pub use rview_core::{
    Category, CategoryConfig, FileSource, HttpSource, Layout, LoadError, LoadState, Model,
    Payload, Problem, ProblemSource, ProblemStore, Question, Stage, StageKind,
};

// --- Web re-exports --------------------------------------------------------

pub use rview_web::{
    Affordance, ClickTarget, ContentKind, DetailModal, Document, DocumentError, MemoryDocument,
    ModalError, PostProcessError, RenderedPanels, Viewer, ViewerError, ViewerEvent,
    render_panels,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Category, ContentValue, Document, FileSource, HttpSource, MemoryDocument, Problem,
        ProblemSource, Viewer, ViewerEvent,
    };

    pub use crate::{core, syntax, text, web};
}

pub use rview_core as core;
pub use rview_syntax as syntax;
pub use rview_text as text;
pub use rview_web as web;
