//! Search session: one interactive search page
//!
//! Wires the suggestion engine, the orchestrator and the location history
//! together. Every transition builds a complete new [`SearchState`],
//! cancels pending suggestion timers, pushes the encoded location and hands
//! the state to the orchestrator, in that order.

use tokio::sync::watch;

use crate::filters::{self, FilterUpdate};
use crate::history::History;
use crate::orchestrator::{SearchBackend, SearchOrchestrator, SearchView};
use crate::pagination::Pagination;
use crate::query;
use crate::state::SearchState;
use crate::suggest::{SuggestionEngine, SuggestionPanel, SuggestionSource};
use crate::SEARCH_PATH;

pub struct SearchSession<B, S> {
    orchestrator: SearchOrchestrator<B>,
    suggestions: SuggestionEngine<S>,
    history: History,
    path: String,
    max_visible_pages: u32,
}

impl<B: SearchBackend, S: SuggestionSource> SearchSession<B, S> {
    /// Open a session at `location` (a path with an optional query string)
    /// and start the search it describes.
    pub fn from_location(
        location: &str,
        orchestrator: SearchOrchestrator<B>,
        suggestions: SuggestionEngine<S>,
        max_visible_pages: u32,
    ) -> Self {
        let state = query::decode(location);
        let path = path_of(location);
        let mut session = Self {
            orchestrator,
            suggestions,
            history: History::new(query::to_location(&path, &state)),
            path,
            max_visible_pages,
        };
        session.load(state);
        session
    }

    pub fn state(&self) -> SearchState {
        self.orchestrator.current_state()
    }

    pub fn view(&self) -> SearchView {
        self.orchestrator.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.orchestrator.subscribe()
    }

    /// The location currently in the history, e.g. `/search?q=quick+sort`.
    pub fn location(&self) -> &str {
        self.history.current().unwrap_or(self.path.as_str())
    }

    pub fn suggestions(&self) -> SuggestionPanel {
        self.suggestions.panel()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<SuggestionPanel> {
        self.suggestions.subscribe()
    }

    /// Navigation for the current search, once one of its pages has arrived.
    ///
    /// Results kept on screen from an earlier search do not count.
    pub fn pagination(&self) -> Option<Pagination> {
        let view = self.view();
        if !view.results_match_state() {
            return None;
        }
        let results = view.results.as_ref()?;
        Some(Pagination::new(
            view.state.page,
            results.total_pages,
            self.max_visible_pages,
        ))
    }

    /// The draft query text changed; only suggestions react.
    pub fn type_query(&mut self, text: &str) {
        self.suggestions.input(text);
    }

    /// Show suggestions for the draft now.
    pub async fn flush_suggestions(&mut self) {
        self.suggestions.flush().await;
    }

    /// Search for the draft query.
    pub fn submit(&mut self) {
        let text = self.suggestions.input_text().to_string();
        self.suggestions.submit();
        let next = filters::set_query(&self.state(), &text);
        self.navigate(next);
    }

    /// Search for a picked suggestion.
    pub fn select_suggestion(&mut self, item: &str) {
        let text = self.suggestions.select(item);
        let next = filters::set_query(&self.state(), &text);
        self.navigate(next);
    }

    pub fn apply(&mut self, update: FilterUpdate) {
        let next = update.apply(&self.state());
        self.navigate(next);
    }

    pub fn go_to_page(&mut self, page: u32) {
        let next = filters::set_page(&self.state(), page);
        self.navigate(next);
    }

    /// Returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        match self.pagination().and_then(|p| p.next()) {
            Some(page) => {
                self.go_to_page(page);
                true
            }
            None => false,
        }
    }

    /// Returns false when already on the first page.
    pub fn previous_page(&mut self) -> bool {
        match self.pagination().and_then(|p| p.previous()) {
            Some(page) => {
                self.go_to_page(page);
                true
            }
            None => false,
        }
    }

    /// Drop the cached page for the current state and fetch it again.
    pub fn refresh(&mut self) {
        self.orchestrator.refresh();
    }

    /// Go back one history entry. Returns false at the oldest entry.
    pub fn back(&mut self) -> bool {
        match self.history.back() {
            Some(location) => {
                let state = query::decode(location);
                self.load(state);
                true
            }
            None => false,
        }
    }

    /// Go forward one history entry. Returns false at the newest entry.
    pub fn forward(&mut self) -> bool {
        match self.history.forward() {
            Some(location) => {
                let state = query::decode(location);
                self.load(state);
                true
            }
            None => false,
        }
    }

    pub fn blur(&mut self) {
        self.suggestions.blur();
    }

    pub fn focus(&mut self) {
        self.suggestions.focus();
    }

    /// Wait for every outstanding search to finish.
    pub async fn settle(&mut self) {
        self.orchestrator.settle().await;
    }

    /// Leave the page: no timer or in-flight search may take effect after this.
    pub fn close(&mut self) {
        self.suggestions.cancel_all();
        self.orchestrator.shutdown();
    }

    fn navigate(&mut self, state: SearchState) {
        self.suggestions.cancel_all();
        let location = query::to_location(&self.path, &state);
        if self.history.push(location) {
            tracing::debug!("Navigated to {}", self.location());
        }
        self.orchestrator.set_state(state);
    }

    /// Apply a state that is already in the history.
    fn load(&mut self, state: SearchState) {
        self.suggestions.reset(&state.query);
        self.orchestrator.set_state(state);
    }
}

/// Path part of a location; bare query strings map to the search path.
fn path_of(location: &str) -> String {
    let without_query = location.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.find("://") {
        Some(idx) => {
            let rest = &without_query[idx + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("")
        }
        None => without_query,
    };

    if path.starts_with('/') {
        path.to_string()
    } else {
        SEARCH_PATH.to_string()
    }
}
