//! Listing glue shared by the events and venues views: debounced search
//! input and page navigation.

pub mod debounce;
pub mod pagination;

use std::time::Duration;
use tokio::sync::watch;

pub use debounce::Debouncer;
pub use pagination::Pagination;

/// Search box state of a listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// What the user has typed so far.
    pub input: String,
    /// The settled query the listing is fetched with.
    pub query: String,
    pub page: u32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            input: String::new(),
            query: String::new(),
            page: 1,
        }
    }
}

impl SearchState {
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Applies a settled query. A different query starts over at page 1.
    /// Returns whether the listing has to be refetched.
    pub fn settle(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.page = 1;
        true
    }

    pub fn next_page(&mut self, pagination: &Pagination) -> bool {
        let next = pagination.next();
        let moved = next.page != self.page;
        self.page = next.page;
        moved
    }

    pub fn previous_page(&mut self, pagination: &Pagination) -> bool {
        let previous = pagination.previous();
        let moved = previous.page != self.page;
        self.page = previous.page;
        moved
    }
}

/// A [`SearchState`] fed through a [`Debouncer`]: typed text only becomes
/// the listing query once typing pauses.
pub struct SearchBox {
    state: SearchState,
    debouncer: Debouncer<String>,
    settled: watch::Receiver<Option<String>>,
}

impl SearchBox {
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let debouncer = Debouncer::new(delay);
        let settled = debouncer.subscribe();
        Self {
            state: SearchState::default(),
            debouncer,
            settled,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    pub fn type_text(&mut self, text: &str) {
        self.state.set_input(text);
        self.debouncer.push(text.trim().to_string());
    }

    /// Waits for typed text to settle and applies it. Returns whether the
    /// listing has to be refetched, or `None` once the debouncer is gone.
    pub async fn next_query(&mut self) -> Option<bool> {
        self.settled.changed().await.ok()?;
        let query = self.settled.borrow_and_update().clone().unwrap_or_default();
        Some(self.state.settle(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_query_resets_page() {
        let mut state = SearchState::default();
        let listing = Pagination::new(100, 24, 1);

        assert!(state.next_page(&listing));
        assert_eq!(state.page, 2);

        state.set_input("bos");
        assert!(state.settle("bos"));
        assert_eq!(state.page, 1);
        assert!(!state.settle("bos"));
    }

    #[test]
    fn test_page_navigation_stops_at_edges() {
        let mut state = SearchState::default();

        assert!(!state.previous_page(&Pagination::new(100, 24, 1)));
        assert_eq!(state.page, 1);

        state.page = 5;
        assert!(!state.next_page(&Pagination::new(100, 24, 5)));
        assert_eq!(state.page, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_box_settles_after_typing_pauses() {
        let mut search = SearchBox::new(Duration::from_millis(500));
        search.state_mut().page = 3;

        search.type_text("bos");
        search.type_text("boston ");
        assert_eq!(search.state().input, "boston ");
        assert_eq!(search.state().query, "");

        assert_eq!(search.next_query().await, Some(true));
        assert_eq!(search.state().query, "boston");
        assert_eq!(search.state().page, 1);
    }
}
