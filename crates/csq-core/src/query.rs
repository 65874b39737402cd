//! Query-string codec for [`SearchState`]
//!
//! The encoded form is what ends up in a shareable location such as
//! `/search?q=quick+sort&languages=rust&page=2`. Defaults are omitted so
//! equal states always produce the same, minimal string. Decoding never
//! fails: anything it does not understand falls back to the default.

use url::form_urlencoded;

use crate::state::{Complexity, Quality, SearchState};

pub const KEY_QUERY: &str = "q";
pub const KEY_PAGE: &str = "page";
pub const KEY_LANGUAGES: &str = "languages";
pub const KEY_REPOSITORIES: &str = "repositories";
pub const KEY_COMPLEXITY: &str = "complexity";
pub const KEY_QUALITY: &str = "quality";

/// Encode a state as a query string (without the leading `?`).
pub fn encode(state: &SearchState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !state.query.is_empty() {
        serializer.append_pair(KEY_QUERY, &state.query);
    }
    for language in &state.filters.languages {
        serializer.append_pair(KEY_LANGUAGES, language);
    }
    for repository in &state.filters.repositories {
        serializer.append_pair(KEY_REPOSITORIES, repository);
    }
    if !state.filters.complexity.is_default() {
        serializer.append_pair(KEY_COMPLEXITY, state.filters.complexity.as_str());
    }
    if !state.filters.quality.is_default() {
        serializer.append_pair(KEY_QUALITY, state.filters.quality.as_str());
    }
    if state.page > 1 {
        serializer.append_pair(KEY_PAGE, &state.page.to_string());
    }

    serializer.finish()
}

/// Decode a query string, a `?`-prefixed string or a full location.
pub fn decode(input: &str) -> SearchState {
    let query_string = query_part(input);
    let mut state = SearchState::default();

    let mut query = None;
    let mut page = None;
    let mut complexity = None;
    let mut quality = None;

    for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
        match key.as_ref() {
            KEY_QUERY => {
                query.get_or_insert_with(|| value.into_owned());
            }
            KEY_PAGE => {
                page.get_or_insert_with(|| parse_page(&value));
            }
            KEY_LANGUAGES if !value.is_empty() => {
                state.filters.languages.insert(value.into_owned());
            }
            KEY_REPOSITORIES if !value.is_empty() => {
                state.filters.repositories.insert(value.into_owned());
            }
            KEY_COMPLEXITY => {
                complexity.get_or_insert_with(|| value.parse::<Complexity>().unwrap_or_default());
            }
            KEY_QUALITY => {
                quality.get_or_insert_with(|| value.parse::<Quality>().unwrap_or_default());
            }
            other => {
                tracing::trace!("Ignoring unknown query key: {}", other);
            }
        }
    }

    state.query = query.unwrap_or_default();
    state.page = page.unwrap_or(1);
    state.filters.complexity = complexity.unwrap_or_default();
    state.filters.quality = quality.unwrap_or_default();
    state
}

/// Render `path` with the encoded state appended, e.g. `/search?q=x`.
pub fn to_location(path: &str, state: &SearchState) -> String {
    let encoded = encode(state);
    if encoded.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{encoded}")
    }
}

/// Pages that are not positive integers normalize to the first page.
fn parse_page(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Strip any path/origin prefix and `#fragment` from a location.
fn query_part(input: &str) -> &str {
    let without_fragment = input.split('#').next().unwrap_or_default();
    // A `?` after the first `=` is part of a value, not a separator.
    let separator = without_fragment
        .find('?')
        .filter(|idx| !without_fragment[..*idx].contains('='));
    match separator {
        Some(idx) => &without_fragment[idx + 1..],
        None if without_fragment.contains('=') || without_fragment.is_empty() => without_fragment,
        // A bare path like "/search" carries no parameters.
        None if without_fragment.starts_with('/') || without_fragment.contains("://") => "",
        None => without_fragment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters;
    use proptest::prelude::*;

    fn sample_state() -> SearchState {
        let mut state = SearchState::with_query("binary search");
        state.page = 3;
        state.filters.languages.insert("rust".to_string());
        state.filters.languages.insert("python".to_string());
        state.filters.repositories.insert("acme/api".to_string());
        state.filters.complexity = Complexity::VeryHigh;
        state.filters.quality = Quality::Good;
        state
    }

    #[test]
    fn test_encode_omits_defaults() {
        assert_eq!(encode(&SearchState::default()), "");
        assert_eq!(encode(&SearchState::with_query("quick sort")), "q=quick+sort");
    }

    #[test]
    fn test_encode_full_state() {
        assert_eq!(
            encode(&sample_state()),
            "q=binary+search&languages=python&languages=rust&repositories=acme%2Fapi\
             &complexity=very_high&quality=good&page=3"
        );
    }

    #[test]
    fn test_round_trip_sample() {
        let state = sample_state();
        assert_eq!(decode(&encode(&state)), state);
    }

    #[test]
    fn test_decode_accepts_locations() {
        let expected = SearchState::with_query("quick sort");
        assert_eq!(decode("q=quick+sort"), expected);
        assert_eq!(decode("?q=quick+sort"), expected);
        assert_eq!(decode("/search?q=quick+sort"), expected);
        assert_eq!(decode("http://localhost:3000/search?q=quick%20sort#top"), expected);
        assert_eq!(decode("/search"), SearchState::default());
        assert_eq!(decode(""), SearchState::default());
        assert_eq!(decode("q=what?"), SearchState::with_query("what?"));
        assert_eq!(decode("q=a?b&page=2").page, 2);
        assert_eq!(decode("/search?q=what?").query, "what?");
    }

    #[test]
    fn test_decode_malformed_page() {
        for raw in ["page=0", "page=-4", "page=abc", "page=2.5", "page=", "page=99999999999"] {
            assert_eq!(decode(raw).page, 1, "input {raw}");
        }
        assert_eq!(decode("page=7").page, 7);
    }

    #[test]
    fn test_decode_ignores_unknown_keys_and_values() {
        let state = decode("q=heap&sort=stars&complexity=extreme&quality=meh&utm_source=x");
        assert_eq!(state.query, "heap");
        assert_eq!(state.filters.complexity, Complexity::All);
        assert_eq!(state.filters.quality, Quality::All);
    }

    #[test]
    fn test_decode_deduplicates_repeated_keys() {
        let state = decode("languages=rust&languages=go&languages=rust&languages=");
        assert_eq!(state.filters.languages.len(), 2);
        assert!(state.filters.languages.contains("rust"));
        assert!(state.filters.languages.contains("go"));
    }

    #[test]
    fn test_single_valued_keys_first_wins() {
        let state = decode("complexity=low&complexity=high&quality=poor&quality=good");
        assert_eq!(state.filters.complexity, Complexity::Low);
        assert_eq!(state.filters.quality, Quality::Poor);
        assert_eq!(encode(&state), "complexity=low&quality=poor");
    }

    #[test]
    fn test_clear_all_encodes_without_filter_keys() {
        let cleared = filters::clear_all(&sample_state());
        assert_eq!(encode(&cleared), "q=binary+search");
    }

    #[test]
    fn test_to_location() {
        assert_eq!(to_location("/search", &SearchState::default()), "/search");
        assert_eq!(
            to_location("/search", &SearchState::with_query("quick sort")),
            "/search?q=quick+sort"
        );
    }

    fn state_strategy() -> impl Strategy<Value = SearchState> {
        let complexity = prop::sample::select(Complexity::ALL.to_vec());
        let quality = prop::sample::select(Quality::ALL.to_vec());
        (
            ".{0,24}",
            1u32..10_000,
            prop::collection::btree_set(".{1,12}", 0..4),
            prop::collection::btree_set("[a-z0-9_./-]{1,16}", 0..3),
            complexity,
            quality,
        )
            .prop_map(|(query, page, languages, repositories, complexity, quality)| {
                let mut state = SearchState::with_query(query);
                state.page = page;
                state.filters.languages = languages;
                state.filters.repositories = repositories;
                state.filters.complexity = complexity;
                state.filters.quality = quality;
                state
            })
    }

    proptest! {
        /// Property: decoding an encoded state gives back the same state
        #[test]
        fn prop_round_trip(state in state_strategy()) {
            prop_assert_eq!(decode(&encode(&state)), state);
        }

        /// Property: decode is total and always yields a valid page
        #[test]
        fn prop_decode_total(input in ".{0,64}") {
            let state = decode(&input);
            prop_assert!(state.page >= 1);
        }

        /// Property: encoding never repeats a single-valued key
        #[test]
        fn prop_single_valued_keys_once(input in "((complexity|quality|page)=[a-z_0-9]{0,10}&){0,6}") {
            let encoded = encode(&decode(&input));
            prop_assert!(encoded.matches("complexity=").count() <= 1);
            prop_assert!(encoded.matches("quality=").count() <= 1);
            prop_assert!(encoded.matches("page=").count() <= 1);
        }
    }
}
