#![forbid(unsafe_code)]

//! Static page output: load categories into a [`MemoryDocument`] and
//! serialize it as a standalone HTML file.

use rview_core::{Category, ProblemSource};
use rview_web::{MemoryDocument, Viewer};
use tracing::info;

/// A document with one container per category, in order.
#[must_use]
pub fn page_document(categories: &[Category]) -> MemoryDocument {
    MemoryDocument::with_containers(categories.iter().map(|c| c.config().container_id))
}

/// Wrap a `<body>` snapshot into a complete HTML document.
#[must_use]
pub fn wrap_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>rview</title>\n</head>\n{body}\n</html>\n"
    )
}

/// Load `categories` from `source`, step each one `advance` problems forward
/// (wrapping, so only `advance` modulo the problem count matters), and return
/// the page.
pub async fn render_page(
    source: &dyn ProblemSource,
    categories: &[Category],
    advance: usize,
) -> String {
    let mut viewer = Viewer::with_categories(page_document(categories), categories);
    viewer.load_all(source).await;
    for category in viewer.categories() {
        let len = viewer.view(category).map_or(0, |view| view.store().len());
        if len == 0 {
            continue;
        }
        for _ in 0..advance % len {
            viewer.next(category);
        }
    }
    let page = wrap_page(&viewer.document().snapshot());
    info!(categories = categories.len(), bytes = page.len(), "page rendered");
    page
}
