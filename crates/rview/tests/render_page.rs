//! End-to-end page rendering from a data directory.

use pretty_assertions::assert_eq;
use rview::page::render_page;
use rview::{Category, FileSource};

// =============================================================================
// Helpers
// =============================================================================

const LEAKAGE: &str = r#"{"problems": [
    {
        "id": "p1",
        "question": {"title": "Two sums", "content": "Find **all** pairs", "url": "https://q.test/1"},
        "model": {
            "name": "Solver",
            "oracle": {"preview_reason": "think", "full_reasoning_trace": "think harder", "code": "def f(a):\n    return a\n", "answer": "$x = 2$"},
            "interrupt": {"answer": "partial", "final": "3"}
        }
    }
]}"#;

fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("examples_leakage.json"), LEAKAGE).unwrap();
    std::fs::write(dir.path().join("examples_doubt.json"), r#"{"problems": []}"#).unwrap();
    dir
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn leakage_page_has_question_panels_and_highlighting() {
    let dir = data_dir();
    let page = render_page(&FileSource::new(dir.path()), &[Category::Leakage], 0).await;

    assert!(page.contains("<h1 id=\"interactive-question-title-leakage\">Examples of Hard Interrupt</h1>"));
    assert!(page.contains("Find <strong>all</strong> pairs"));
    assert!(page.contains("<h2>Solver</h2>"));
    assert_eq!(page.matches("<section class=\"panel\">").count(), 2);
    assert!(page.contains("<span class=\"mathjax-latex\">\\(x = 2\\)</span>"));
    assert!(page.contains("<span class=\"hljs-keyword\">def</span>"));
    assert!(page.contains("<div class=\"final-answer\">3</div>"));
}

#[tokio::test]
async fn advance_wraps_single_problem() {
    let dir = data_dir();
    let source = FileSource::new(dir.path());
    let at_start = render_page(&source, &[Category::Leakage], 0).await;
    let advanced = render_page(&source, &[Category::Leakage], 5).await;
    assert_eq!(advanced, at_start);
}

#[tokio::test]
async fn each_category_reports_its_own_state() {
    let dir = data_dir();
    let page = render_page(
        &FileSource::new(dir.path()),
        &[Category::Default, Category::Leakage, Category::Doubt],
        0,
    )
    .await;
    assert!(page.contains(
        "<div class=\"interactive-viz\"><div class=\"wrapper\"><div class=\"header\"><h1>Failed to load examples.</h1>"
    ));
    assert!(page.contains(
        "<div class=\"interactive-viz-doubt\"><div class=\"wrapper\"><div class=\"header\"><h1>No problems available.</h1>"
    ));
    assert!(page.contains("Two sums"));
}
