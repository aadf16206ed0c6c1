#![forbid(unsafe_code)]

//! The page the viewer draws into.
//!
//! The viewer never touches a real DOM. It talks to a [`Document`], which a
//! browser host implements over its own element tree and which
//! [`MemoryDocument`] implements in memory for tests and static output.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use rview_text::{escape_attr, escape_text};

use crate::postprocess::PostProcessError;

/// A document operation named an element that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    MissingElement(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingElement(id) => write!(f, "no element with id {id:?}"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Host interface to the page.
///
/// Elements are addressed by id. Ids appearing in inserted HTML become
/// addressable once the HTML is inserted.
pub trait Document {
    fn has_element(&self, id: &str) -> bool;

    /// Current inner HTML of an element.
    fn inner_html(&self, id: &str) -> Option<String>;

    /// Replace an element's children with `html`.
    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), DocumentError>;

    /// Replace an element's children with a text node.
    fn set_text(&mut self, id: &str, text: &str) -> Result<(), DocumentError> {
        self.set_inner_html(id, &escape_text(text))
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), DocumentError>;

    /// Scroll an element back to its top.
    fn reset_scroll(&mut self, id: &str) -> Result<(), DocumentError>;

    /// Append markup at the end of the body.
    fn append_to_body(&mut self, html: &str);

    fn set_body_class(&mut self, class: &str, on: bool);

    /// Hand the math inside `scope` to the typesetter.
    fn typeset(&mut self, scope: &str) -> Result<(), PostProcessError>;
}

// ---------------------------------------------------------------------------
// MemoryDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Parent {
    /// Created by the host with [`MemoryDocument::add_container`].
    Root,
    /// Declared in markup passed to `append_to_body`.
    Body,
    /// Declared in markup inserted into another element.
    Element(String),
}

#[derive(Debug, Clone)]
struct Element {
    parent: Parent,
    html: String,
    visible: bool,
    scroll_top: u32,
}

impl Element {
    fn new(parent: Parent) -> Self {
        Self {
            parent,
            html: String::new(),
            visible: true,
            scroll_top: 0,
        }
    }
}

/// An in-memory [`Document`].
///
/// Each element keeps its own inner HTML. [`MemoryDocument::snapshot`]
/// reassembles the page by splicing every element's content in after its
/// opening tag.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: HashMap<String, Element>,
    roots: Vec<String>,
    body_html: String,
    body_classes: BTreeSet<String>,
    typeset_calls: Vec<String>,
    fail_typeset: bool,
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding one empty container per id.
    #[must_use]
    pub fn with_containers<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut doc = Self::new();
        for id in ids {
            doc.add_container(id);
        }
        doc
    }

    /// Add an empty top-level container. Existing ids are left alone.
    pub fn add_container(&mut self, id: &str) {
        if !self.elements.contains_key(id) {
            self.elements.insert(id.to_string(), Element::new(Parent::Root));
            self.roots.push(id.to_string());
        }
    }

    /// Make every later `typeset` call fail.
    pub fn fail_typesetting(&mut self, fail: bool) {
        self.fail_typeset = fail;
    }

    /// Simulate the user scrolling an element.
    pub fn scroll_to(&mut self, id: &str, top: u32) {
        if let Some(el) = self.elements.get_mut(id) {
            el.scroll_top = top;
        }
    }

    #[must_use]
    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.elements.get(id).map(|el| el.visible)
    }

    #[must_use]
    pub fn scroll_top(&self, id: &str) -> Option<u32> {
        self.elements.get(id).map(|el| el.scroll_top)
    }

    #[must_use]
    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    #[must_use]
    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    /// Scopes passed to `typeset`, in call order.
    #[must_use]
    pub fn typeset_calls(&self) -> &[String] {
        &self.typeset_calls
    }

    /// The element and everything inserted below it, as one string.
    #[must_use]
    pub fn expanded_html(&self, id: &str) -> Option<String> {
        self.elements
            .get(id)
            .map(|el| self.expand(&el.html, &Parent::Element(id.to_string())))
    }

    /// The whole page: top-level containers in creation order, then the body
    /// markup.
    #[must_use]
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        out.push_str("<body");
        if !self.body_classes.is_empty() {
            let classes: Vec<&str> = self.body_classes.iter().map(String::as_str).collect();
            out.push_str(" class=\"");
            out.push_str(&escape_attr(&classes.join(" ")));
            out.push('"');
        }
        out.push_str(">\n");
        for id in &self.roots {
            let Some(el) = self.elements.get(id) else {
                continue;
            };
            out.push_str("<div id=\"");
            out.push_str(&escape_attr(id));
            out.push('"');
            if !el.visible {
                out.push_str(" hidden");
            }
            out.push('>');
            out.push_str(&self.expand(&el.html, &Parent::Element(id.clone())));
            out.push_str("</div>\n");
        }
        out.push_str(&self.expand(&self.body_html, &Parent::Body));
        out.push_str("\n</body>");
        out
    }

    fn element(&mut self, id: &str) -> Result<&mut Element, DocumentError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| DocumentError::MissingElement(id.to_string()))
    }

    /// Drop every element registered below `parent`, recursively.
    fn remove_descendants(&mut self, parent: &Parent) {
        let children: Vec<String> = self
            .elements
            .iter()
            .filter(|(_, el)| &el.parent == parent)
            .map(|(id, _)| id.clone())
            .collect();
        for child in children {
            self.elements.remove(&child);
            self.remove_descendants(&Parent::Element(child));
        }
    }

    fn register_ids(&mut self, html: &str, parent: &Parent) {
        for id in declared_ids(html) {
            self.remove_descendants(&Parent::Element(id.clone()));
            self.roots.retain(|root| root != &id);
            self.elements.insert(id, Element::new(parent.clone()));
        }
    }

    /// Splice each child's content in after its opening tag.
    fn expand(&self, html: &str, parent: &Parent) -> String {
        let mut splices: Vec<(usize, &str, &Element)> = self
            .elements
            .iter()
            .filter(|(_, el)| &el.parent == parent)
            .filter_map(|(id, el)| opening_tag_end(html, id).map(|end| (end, id.as_str(), el)))
            .collect();
        splices.sort_by_key(|(end, _, _)| *end);

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for (end, id, el) in splices {
            out.push_str(&html[cursor..end]);
            if !el.visible {
                out.push_str(" hidden");
            }
            out.push('>');
            out.push_str(&self.expand(&el.html, &Parent::Element(id.to_string())));
            cursor = end + 1;
        }
        out.push_str(&html[cursor..]);
        out
    }
}

impl Document for MemoryDocument {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn inner_html(&self, id: &str) -> Option<String> {
        self.elements.get(id).map(|el| el.html.clone())
    }

    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), DocumentError> {
        self.element(id)?;
        let parent = Parent::Element(id.to_string());
        self.remove_descendants(&parent);
        self.register_ids(html, &parent);
        self.element(id)?.html = html.to_string();
        Ok(())
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), DocumentError> {
        self.element(id)?.visible = visible;
        Ok(())
    }

    fn reset_scroll(&mut self, id: &str) -> Result<(), DocumentError> {
        self.element(id)?.scroll_top = 0;
        Ok(())
    }

    fn append_to_body(&mut self, html: &str) {
        self.register_ids(html, &Parent::Body);
        self.body_html.push_str(html);
    }

    fn set_body_class(&mut self, class: &str, on: bool) {
        if on {
            self.body_classes.insert(class.to_string());
        } else {
            self.body_classes.remove(class);
        }
    }

    fn typeset(&mut self, scope: &str) -> Result<(), PostProcessError> {
        if !self.elements.contains_key(scope) {
            return Err(PostProcessError::MissingScope(scope.to_string()));
        }
        if self.fail_typeset {
            return Err(PostProcessError::Typeset(format!(
                "typesetter unavailable for {scope}"
            )));
        }
        self.typeset_calls.push(scope.to_string());
        Ok(())
    }
}

/// Byte ranges of every tag in `html`, from `<` to the first `>` outside a
/// quoted attribute value. Escaped text (`&lt;...&gt;`) holds no tags.
fn tag_spans(html: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open = None;
    let mut quote = None;
    for (i, c) in html.char_indices() {
        match (open, quote, c) {
            (None, _, '<') => open = Some(i),
            (None, _, _) => {}
            (Some(_), Some(q), _) if c == q => quote = None,
            (Some(_), Some(_), _) => {}
            (Some(_), None, '"' | '\'') => quote = Some(c),
            (Some(start), None, '>') => {
                spans.push((start, i));
                open = None;
            }
            (Some(_), None, _) => {}
        }
    }
    spans
}

/// The `id` attribute of a single tag, if it has a non-empty one.
fn tag_id(tag: &str) -> Option<&str> {
    let mut quote = None;
    for (i, c) in tag.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() && tag[i + c.len_utf8()..].starts_with("id=\"") => {
                let value = &tag[i + c.len_utf8() + 4..];
                let close = value.find('"')?;
                return (close > 0).then(|| &value[..close]);
            }
            None => {}
        }
    }
    None
}

/// Values of every ` id="..."` attribute declared by a tag in `html`.
fn declared_ids(html: &str) -> Vec<String> {
    tag_spans(html)
        .into_iter()
        .filter_map(|(start, end)| tag_id(&html[start..end]))
        .map(str::to_string)
        .collect()
}

/// Byte offset of the `>` closing the tag that declares `id`.
fn opening_tag_end(html: &str, id: &str) -> Option<usize> {
    tag_spans(html)
        .into_iter()
        .find(|&(start, end)| tag_id(&html[start..end]) == Some(id))
        .map(|(_, end)| end)
}
