//! Filter composition: every state transition a user can make
//!
//! Each function takes the current state and returns a complete new one.
//! Anything that changes the result set resets pagination to page 1;
//! [`set_page`] is the only transition that keeps the filters and moves
//! the page.

use crate::state::{Complexity, FilterSet, Quality, SearchState};

/// A partial filter update, as produced by a UI control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    ToggleLanguage(String),
    ToggleRepository(String),
    Complexity(Complexity),
    Quality(Quality),
    ClearAll,
}

impl FilterUpdate {
    /// Apply this update to `state`, producing the next state.
    pub fn apply(&self, state: &SearchState) -> SearchState {
        match self {
            FilterUpdate::ToggleLanguage(language) => toggle_language(state, language),
            FilterUpdate::ToggleRepository(repository) => toggle_repository(state, repository),
            FilterUpdate::Complexity(value) => set_complexity(state, *value),
            FilterUpdate::Quality(value) => set_quality(state, *value),
            FilterUpdate::ClearAll => clear_all(state),
        }
    }
}

/// Add `language` if absent, remove it if present.
pub fn toggle_language(state: &SearchState, language: &str) -> SearchState {
    let mut filters = state.filters.clone();
    toggle(&mut filters.languages, language);
    with_filters(state, filters)
}

/// Add `repository` if absent, remove it if present.
pub fn toggle_repository(state: &SearchState, repository: &str) -> SearchState {
    let mut filters = state.filters.clone();
    toggle(&mut filters.repositories, repository);
    with_filters(state, filters)
}

pub fn set_complexity(state: &SearchState, complexity: Complexity) -> SearchState {
    let filters = FilterSet {
        complexity,
        ..state.filters.clone()
    };
    with_filters(state, filters)
}

pub fn set_quality(state: &SearchState, quality: Quality) -> SearchState {
    let filters = FilterSet {
        quality,
        ..state.filters.clone()
    };
    with_filters(state, filters)
}

/// Reset every filter to its default. The query survives.
pub fn clear_all(state: &SearchState) -> SearchState {
    with_filters(state, FilterSet::default())
}

/// Replace the query text. Filters survive, the page does not.
pub fn set_query(state: &SearchState, query: &str) -> SearchState {
    SearchState {
        query: query.trim().to_string(),
        page: 1,
        filters: state.filters.clone(),
    }
}

/// Move to `page` (clamped to 1) without touching query or filters.
pub fn set_page(state: &SearchState, page: u32) -> SearchState {
    SearchState {
        page: page.max(1),
        ..state.clone()
    }
}

fn with_filters(state: &SearchState, filters: FilterSet) -> SearchState {
    SearchState {
        query: state.query.clone(),
        page: 1,
        filters,
    }
}

fn toggle(set: &mut std::collections::BTreeSet<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_page_four() -> SearchState {
        let mut state = SearchState::with_query("merge sort");
        state.page = 4;
        state
    }

    #[test]
    fn test_toggle_language_adds_and_resets_page() {
        let next = toggle_language(&on_page_four(), "rust");
        assert!(next.filters.languages.contains("rust"));
        assert_eq!(next.page, 1);
        assert_eq!(next.query, "merge sort");
    }

    #[test]
    fn test_double_toggle_is_identity_on_languages() {
        let mut start = on_page_four();
        start.filters.languages.insert("go".to_string());

        let twice = toggle_language(&toggle_language(&start, "rust"), "rust");
        assert_eq!(twice.filters.languages, start.filters.languages);

        let removed_and_back = toggle_language(&toggle_language(&start, "go"), "go");
        assert_eq!(removed_and_back.filters.languages, start.filters.languages);
    }

    #[test]
    fn test_toggle_ignores_blank_values() {
        let next = toggle_repository(&on_page_four(), "  ");
        assert!(next.filters.repositories.is_empty());
    }

    #[test]
    fn test_set_complexity_and_quality_replace_single_value() {
        let state = set_complexity(&on_page_four(), Complexity::Low);
        let state = set_complexity(&state, Complexity::High);
        assert_eq!(state.filters.complexity, Complexity::High);
        assert_eq!(state.page, 1);

        let state = set_quality(&set_page(&state, 3), Quality::Excellent);
        assert_eq!(state.filters.quality, Quality::Excellent);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_clear_all_keeps_query() {
        let state = FilterUpdate::ToggleLanguage("rust".to_string()).apply(&on_page_four());
        let state = FilterUpdate::Complexity(Complexity::Medium).apply(&state);
        let state = set_page(&state, 6);

        let cleared = FilterUpdate::ClearAll.apply(&state);
        assert_eq!(cleared.query, "merge sort");
        assert_eq!(cleared.page, 1);
        assert!(cleared.filters.is_empty());
    }

    #[test]
    fn test_set_page_keeps_filters() {
        let filtered = toggle_language(&on_page_four(), "python");
        let paged = set_page(&filtered, 9);
        assert_eq!(paged.page, 9);
        assert_eq!(paged.filters, filtered.filters);
        assert_eq!(set_page(&filtered, 0).page, 1);
    }

    #[test]
    fn test_set_query_trims_and_resets_page() {
        let filtered = toggle_language(&on_page_four(), "python");
        let next = set_query(&set_page(&filtered, 5), "  heap sort ");
        assert_eq!(next.query, "heap sort");
        assert_eq!(next.page, 1);
        assert_eq!(next.filters, filtered.filters);
    }
}
