#![forbid(unsafe_code)]

//! Categories of comparison and their rendering parameters.
//!
//! Each category is one page section backed by one data file. They differ only
//! in the values held by [`CategoryConfig`].

use std::fmt;
use std::str::FromStr;

use crate::model::{Layout, Model, StageKind};

/// A page section of comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// The original, unsuffixed section.
    Default,
    /// Hard interrupt.
    Leakage,
    /// Soft interrupt (speedup).
    Panic,
    /// Update-driven interrupt.
    Doubt,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Default, Self::Leakage, Self::Panic, Self::Doubt];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Leakage => "leakage",
            Self::Panic => "panic",
            Self::Doubt => "doubt",
        }
    }

    #[must_use]
    pub const fn config(self) -> CategoryConfig {
        match self {
            Self::Default => CategoryConfig {
                category: self,
                resource_path: "./interactive_examples_data.json",
                container_id: "interactive-viz-container",
                wrapper_class: "interactive-viz",
                id_suffix: "",
                heading: "Interactive Examples",
                default_layout: LayoutRule::Two,
                section_set: SectionSet::Standard,
                oracle_label: "Full Thinking",
                interrupt_label: "Hard Interrupt @0.3",
            },
            Self::Leakage => CategoryConfig {
                category: self,
                resource_path: "./examples_leakage.json",
                container_id: "interactive-vis-container-leakage",
                wrapper_class: "interactive-viz-leakage",
                id_suffix: "-leakage",
                heading: "Examples of Hard Interrupt",
                default_layout: LayoutRule::Two,
                section_set: SectionSet::Standard,
                oracle_label: "Full Thinking",
                interrupt_label: "Hard Interrupt @0.3",
            },
            Self::Panic => CategoryConfig {
                category: self,
                resource_path: "./examples_panic.json",
                container_id: "interactive-vis-container-panic",
                wrapper_class: "interactive-viz-panic",
                id_suffix: "-panic",
                heading: "Examples of Soft Interrupt (Speedup)",
                default_layout: LayoutRule::Single,
                section_set: SectionSet::SoftInterrupt,
                oracle_label: "Full Thinking",
                interrupt_label: "Full Thinking",
            },
            Self::Doubt => CategoryConfig {
                category: self,
                resource_path: "./examples_doubt.json",
                container_id: "interactive-vis-container-doubt",
                wrapper_class: "interactive-viz-doubt",
                id_suffix: "-doubt",
                heading: "Examples of Update-Driven Interrupt",
                default_layout: LayoutRule::TwoIfInterrupt,
                section_set: SectionSet::UpdateDriven,
                oracle_label: "Full Thinking",
                interrupt_label: "Intervene @0.3",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category {:?} (expected one of: default, leakage, panic, doubt)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Layout used when a model record does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutRule {
    Two,
    Single,
    /// Two columns iff the model has an interrupt stage.
    TwoIfInterrupt,
}

/// Which sections each panel is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionSet {
    /// Reasoning, code, answer, final.
    Standard,
    /// Pre-interrupt reasoning, interrupt + later reasoning, code, answer, final.
    SoftInterrupt,
    /// Shared pre-update reasoning in the header, then per panel: update,
    /// post-interrupt reasoning, answer, code, final.
    UpdateDriven,
}

/// Everything that distinguishes one category's pipeline from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryConfig {
    pub category: Category,
    pub resource_path: &'static str,
    pub container_id: &'static str,
    pub wrapper_class: &'static str,
    /// Appended to every element id the category creates.
    pub id_suffix: &'static str,
    pub heading: &'static str,
    pub default_layout: LayoutRule,
    pub section_set: SectionSet,
    pub oracle_label: &'static str,
    pub interrupt_label: &'static str,
}

impl CategoryConfig {
    /// Element id `base` qualified with the category suffix.
    #[must_use]
    pub fn id(&self, base: &str) -> String {
        format!("{base}{}", self.id_suffix)
    }

    /// The layout for `model`: its own, else the category default.
    #[must_use]
    pub fn layout_for(&self, model: &Model) -> Layout {
        model.layout.unwrap_or(match self.default_layout {
            LayoutRule::Two => Layout::Two,
            LayoutRule::Single => Layout::Single,
            LayoutRule::TwoIfInterrupt if model.has_interrupt() => Layout::Two,
            LayoutRule::TwoIfInterrupt => Layout::Single,
        })
    }

    /// Default panel heading for a stage.
    #[must_use]
    pub const fn stage_label(&self, kind: StageKind) -> &'static str {
        match kind {
            StageKind::Oracle => self.oracle_label,
            StageKind::Interrupt => self.interrupt_label,
        }
    }
}
