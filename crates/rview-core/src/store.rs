#![forbid(unsafe_code)]

//! Per-category problem list with a wrapping cursor.

use tracing::{error, info};

use crate::model::{Payload, Problem};
use crate::source::{LoadError, ProblemSource};

/// Lifecycle of a store's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// The problems of one category and the index of the one being shown.
///
/// Invariant: `cursor < problems.len()` whenever `problems` is non-empty,
/// and `cursor == 0` otherwise.
#[derive(Debug, Clone, Default)]
pub struct ProblemStore {
    problems: Vec<Problem>,
    cursor: usize,
    state: LoadState,
}

impl ProblemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is already loaded with `problems`.
    #[must_use]
    pub fn with_problems(problems: Vec<Problem>) -> Self {
        Self {
            problems,
            cursor: 0,
            state: LoadState::Loaded,
        }
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// The problem at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Problem> {
        self.problems.get(self.cursor)
    }

    /// Advance, wrapping to the first problem. No-op when empty.
    pub fn next(&mut self) {
        if !self.problems.is_empty() {
            self.cursor = (self.cursor + 1) % self.problems.len();
        }
    }

    /// Step back, wrapping to the last problem. No-op when empty.
    pub fn previous(&mut self) {
        if !self.problems.is_empty() {
            let len = self.problems.len();
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    /// Mark a load as started.
    ///
    /// # Errors
    ///
    /// [`LoadError::AlreadyLoading`] if a load is in flight.
    pub fn begin_load(&mut self) -> Result<(), LoadError> {
        if self.state == LoadState::Loading {
            return Err(LoadError::AlreadyLoading);
        }
        self.state = LoadState::Loading;
        Ok(())
    }

    /// Apply a fetch result, returning the number of problems loaded.
    ///
    /// On failure the store is left empty in [`LoadState::Failed`] and the
    /// error is handed back.
    ///
    /// # Errors
    ///
    /// The fetch error, unchanged.
    pub fn apply(&mut self, result: Result<Payload, LoadError>) -> Result<usize, LoadError> {
        self.cursor = 0;
        match result {
            Ok(payload) => {
                self.problems = payload.problems;
                self.state = LoadState::Loaded;
                info!(count = self.problems.len(), "problems loaded");
                Ok(self.problems.len())
            }
            Err(err) => {
                self.problems.clear();
                self.state = LoadState::Failed;
                error!(error = %err, "failed to load problems");
                Err(err)
            }
        }
    }

    /// Fetch `path` from `source` and apply the result.
    ///
    /// # Errors
    ///
    /// [`LoadError::AlreadyLoading`] if a load is in flight, else the fetch
    /// error.
    pub async fn load(
        &mut self,
        source: &dyn ProblemSource,
        path: &str,
    ) -> Result<usize, LoadError> {
        self.begin_load()?;
        let result = source.fetch(path).await;
        self.apply(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::model::Question;

    fn titled(title: &str) -> Problem {
        Problem {
            question: Question {
                title: title.to_string(),
                ..Question::default()
            },
            ..Problem::default()
        }
    }

    fn store_of(n: usize) -> ProblemStore {
        ProblemStore::with_problems((0..n).map(|i| titled(&format!("P{i}"))).collect())
    }

    struct Fixed(Vec<&'static str>);

    #[async_trait]
    impl ProblemSource for Fixed {
        async fn fetch(&self, _path: &str) -> Result<Payload, LoadError> {
            Ok(Payload {
                problems: self.0.iter().map(|t| titled(t)).collect(),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl ProblemSource for Failing {
        async fn fetch(&self, _path: &str) -> Result<Payload, LoadError> {
            Err(LoadError::Status(503))
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    #[test]
    fn next_wraps_after_full_cycle() {
        let mut store = store_of(3);
        for _ in 0..3 {
            store.next();
        }
        assert_eq!(store.cursor(), 0);
    }

    #[test]
    fn previous_from_start_is_last() {
        let mut store = store_of(4);
        store.previous();
        assert_eq!(store.cursor(), 3);
        assert_eq!(store.current().unwrap().question.title, "P3");
    }

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut store = ProblemStore::new();
        store.next();
        store.previous();
        assert_eq!(store.cursor(), 0);
        assert!(store.current().is_none());
    }

    #[test]
    fn single_problem_stays_put() {
        let mut store = store_of(1);
        store.next();
        assert_eq!(store.cursor(), 0);
        store.previous();
        assert_eq!(store.cursor(), 0);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[tokio::test]
    async fn load_replaces_problems_and_resets_cursor() {
        let mut store = store_of(5);
        store.next();
        store.next();
        let count = store
            .load(&Fixed(vec!["A", "B"]), "./x.json")
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.cursor(), 0);
        assert_eq!(store.state(), LoadState::Loaded);
        assert_eq!(store.current().unwrap().question.title, "A");
    }

    #[tokio::test]
    async fn failed_load_empties_store() {
        let mut store = store_of(2);
        let err = store.load(&Failing, "./x.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Status(503)));
        assert_eq!(store.state(), LoadState::Failed);
        assert!(store.is_empty());
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut store = ProblemStore::new();
        store.begin_load().unwrap();
        assert!(matches!(store.begin_load(), Err(LoadError::AlreadyLoading)));
        assert_eq!(store.state(), LoadState::Loading);
    }

    #[test]
    fn apply_empty_payload_is_loaded_and_empty() {
        let mut store = ProblemStore::new();
        store.begin_load().unwrap();
        assert_eq!(store.apply(Ok(Payload::default())).unwrap(), 0);
        assert_eq!(store.state(), LoadState::Loaded);
        assert!(store.is_empty());
    }
}
