#![forbid(unsafe_code)]

//! Core types for rview.
//!
//! - [`model`] - problem records, read leniently from JSON
//! - [`category`] - the four page sections and their parameters
//! - [`source`] - payload loaders (directory, HTTP)
//! - [`store`] - per-category problem list with a wrapping cursor

pub mod category;
pub mod model;
pub mod source;
pub mod store;

pub use category::{Category, CategoryConfig, LayoutRule, SectionSet, UnknownCategory};
pub use model::{Layout, Model, Payload, Problem, Question, Stage, StageKind};
pub use source::{FileSource, HttpSource, LoadError, ProblemSource};
pub use store::{LoadState, ProblemStore};
