//! Query suggestions with debounced recomputation
//!
//! Matching is a plain case-insensitive substring filter over a candidate
//! pool in pool order; ranking is left to the search service. The engine
//! only recomputes once input has been idle for the debounce window, and a
//! generation counter keeps a slow recompute from publishing over newer
//! input.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::client::ApiClient;
use crate::timer::{Generation, Timer};
use crate::{Result, SUGGESTION_MIN_CHARS};

/// Built-in candidates for local mode.
pub const DEFAULT_POOL: &[&str] = &[
    "sorting algorithm",
    "binary search",
    "quick sort",
    "merge sort",
    "bubble sort",
    "function definition",
    "class constructor",
    "error handling",
    "try catch",
    "async await",
    "promise handling",
    "database query",
    "api endpoint",
    "authentication",
    "unit test",
    "integration test",
    "data structure",
    "linked list",
    "binary tree",
    "hash table",
    "stack implementation",
    "queue implementation",
    "recursive function",
    "iterative solution",
    "design pattern",
    "singleton pattern",
    "factory pattern",
    "observer pattern",
    "middleware function",
    "route handler",
];

/// Whether `input` is long enough to show suggestions for.
pub fn is_active(input: &str) -> bool {
    input.trim().chars().count() > SUGGESTION_MIN_CHARS
}

/// Lazily yield the pool entries containing `input`, ignoring case.
///
/// Yields nothing while the input is below the activation threshold.
pub fn matches<'a>(pool: &'a [String], input: &str) -> impl Iterator<Item = &'a str> + use<'a> {
    let needle = is_active(input).then(|| input.trim().to_lowercase());
    pool.iter()
        .map(String::as_str)
        .filter(move |candidate| match &needle {
            Some(needle) => candidate.to_lowercase().contains(needle.as_str()),
            None => false,
        })
}

/// First `limit` matches of `input` in `pool`.
pub fn filter_candidates(pool: &[String], input: &str, limit: usize) -> Vec<String> {
    matches(pool, input).take(limit).map(String::from).collect()
}

/// Where candidate completions come from.
pub trait SuggestionSource: Send + Sync + 'static {
    fn suggest(
        &self,
        input: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Filters a static pool in memory.
#[derive(Debug, Clone)]
pub struct LocalSuggestions {
    pool: Vec<String>,
}

impl LocalSuggestions {
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Default for LocalSuggestions {
    fn default() -> Self {
        Self::new(DEFAULT_POOL.iter().map(|s| s.to_string()).collect())
    }
}

impl SuggestionSource for LocalSuggestions {
    async fn suggest(&self, input: &str, limit: usize) -> Result<Vec<String>> {
        Ok(filter_candidates(&self.pool, input, limit))
    }
}

/// Asks the search service's suggestions endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSuggestions {
    client: ApiClient,
}

impl RemoteSuggestions {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl SuggestionSource for RemoteSuggestions {
    async fn suggest(&self, input: &str, limit: usize) -> Result<Vec<String>> {
        if !is_active(input) {
            return Ok(Vec::new());
        }
        let mut suggestions = self.client.suggestions(input.trim(), limit).await?;
        suggestions.truncate(limit);
        Ok(suggestions)
    }
}

/// What the suggestion dropdown shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionPanel {
    pub visible: bool,
    pub items: Vec<String>,
}

/// Debounced suggestions for an input field.
pub struct SuggestionEngine<S> {
    source: Arc<S>,
    limit: usize,
    input: String,
    generation: Generation,
    debounce: Timer,
    blur: Timer,
    panel: Arc<watch::Sender<SuggestionPanel>>,
}

impl<S: SuggestionSource> SuggestionEngine<S> {
    pub fn new(source: Arc<S>, limit: usize, debounce: Duration, blur_grace: Duration) -> Self {
        let (panel, _) = watch::channel(SuggestionPanel::default());
        Self {
            source,
            limit,
            input: String::new(),
            generation: Generation::new(),
            debounce: Timer::new(debounce),
            blur: Timer::new(blur_grace),
            panel: Arc::new(panel),
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input
    }

    pub fn panel(&self) -> SuggestionPanel {
        self.panel.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionPanel> {
        self.panel.subscribe()
    }

    /// The input text changed. Recomputes after the debounce window.
    pub fn input(&mut self, text: &str) {
        self.input = text.to_string();
        let generation = self.generation.advance();
        self.debounce.cancel();

        if !is_active(text) {
            self.hide();
            return;
        }

        tracing::trace!("Scheduling suggestions for {:?}", text);
        let task = self.recompute(generation);
        self.debounce.schedule(task);
    }

    /// Recompute right away instead of waiting for the debounce window.
    pub async fn flush(&mut self) {
        let generation = self.generation.advance();
        self.debounce.cancel();

        if !is_active(&self.input) {
            self.hide();
            return;
        }
        self.recompute(generation).await;
    }

    /// Pick a suggestion. Cancels all pending work and hides the panel;
    /// the returned text is the query to search for.
    pub fn select(&mut self, item: &str) -> String {
        self.cancel_all();
        self.input = item.to_string();
        self.hide();
        self.input.clone()
    }

    /// Replace the input text without recomputing, e.g. after navigation.
    pub fn reset(&mut self, text: &str) {
        self.cancel_all();
        self.input = text.to_string();
        self.hide();
    }

    /// The query was submitted directly.
    pub fn submit(&mut self) {
        self.cancel_all();
        self.hide();
    }

    /// The input lost focus. Hides the panel after the grace delay, so a
    /// click on a suggestion still lands.
    pub fn blur(&mut self) {
        self.generation.advance();
        self.debounce.cancel();
        let panel = self.panel.clone();
        self.blur.schedule(async move {
            panel.send_replace(SuggestionPanel::default());
        });
    }

    /// The input regained focus before the grace delay ran out.
    pub fn focus(&mut self) {
        self.blur.cancel();
    }

    /// Drop every pending timer and in-progress recompute.
    pub fn cancel_all(&mut self) {
        self.generation.advance();
        self.debounce.cancel();
        self.blur.cancel();
    }

    fn hide(&self) {
        self.panel.send_replace(SuggestionPanel::default());
    }

    fn recompute(&self, generation: u64) -> impl Future<Output = ()> + Send + use<S> {
        let source = self.source.clone();
        let input = self.input.clone();
        let limit = self.limit;
        let current = self.generation.clone();
        let panel = self.panel.clone();

        async move {
            match source.suggest(&input, limit).await {
                Ok(items) if current.is_current(generation) => {
                    panel.send_replace(SuggestionPanel {
                        visible: !items.is_empty(),
                        items,
                    });
                }
                Ok(_) => tracing::trace!("Dropping suggestions for superseded input {:?}", input),
                Err(e) => tracing::warn!("Suggestion lookup failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool() -> Vec<String> {
        DEFAULT_POOL.iter().map(|s| s.to_string()).collect()
    }

    /// Local source that counts lookups.
    #[derive(Default)]
    struct CountingSource {
        inner: LocalSuggestions,
        lookups: AtomicUsize,
    }

    impl SuggestionSource for CountingSource {
        async fn suggest(&self, input: &str, limit: usize) -> Result<Vec<String>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.suggest(input, limit).await
        }
    }

    fn engine() -> (Arc<CountingSource>, SuggestionEngine<CountingSource>) {
        let source = Arc::new(CountingSource::default());
        let engine = SuggestionEngine::new(
            source.clone(),
            5,
            Duration::from_millis(300),
            Duration::from_millis(200),
        );
        (source, engine)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn test_activation_threshold() {
        assert!(filter_candidates(&pool(), "qu", 5).is_empty());
        assert_eq!(filter_candidates(&pool(), "QUI", 5), vec!["quick sort"]);
    }

    #[test]
    fn test_matches_keep_pool_order_and_cap() {
        let found = filter_candidates(&pool(), "sort", 5);
        assert_eq!(
            found,
            vec!["sorting algorithm", "quick sort", "merge sort", "bubble sort"]
        );
        assert_eq!(filter_candidates(&pool(), "tion", 5).len(), 5);
    }

    #[test]
    fn test_matches_is_restartable() {
        let pool = pool();
        let first: Vec<_> = matches(&pool, "pattern").collect();
        let second: Vec<_> = matches(&pool, "pattern").collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_hides_immediately() {
        let (source, mut engine) = engine();
        engine.input("bi");
        assert_eq!(engine.panel(), SuggestionPanel::default());
        sleep_ms(1000).await;
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recompute_waits_for_idle_input() {
        let (source, mut engine) = engine();

        engine.input("bin");
        sleep_ms(100).await;
        engine.input("bina");
        sleep_ms(100).await;
        engine.input("binar");
        sleep_ms(250).await;
        assert!(!engine.panel().visible);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);

        sleep_ms(100).await;
        let panel = engine.panel();
        assert!(panel.visible);
        assert_eq!(panel.items, vec!["binary search", "binary tree"]);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_matches_keeps_panel_hidden() {
        let (_, mut engine) = engine();
        engine.input("zzzz");
        sleep_ms(400).await;
        assert!(!engine.panel().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_skips_the_debounce() {
        let (_, mut engine) = engine();
        engine.input("hash");
        engine.flush().await;
        assert_eq!(engine.panel().items, vec!["hash table"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_cancels_pending_recompute() {
        let (source, mut engine) = engine();
        engine.input("qui");
        let query = engine.select("quick sort");
        assert_eq!(query, "quick sort");
        assert_eq!(engine.input_text(), "quick sort");

        sleep_ms(1000).await;
        assert!(!engine.panel().visible);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_hides_after_grace_delay() {
        let (_, mut engine) = engine();
        engine.input("merge");
        sleep_ms(350).await;
        assert!(engine.panel().visible);

        engine.blur();
        sleep_ms(150).await;
        assert!(engine.panel().visible);
        sleep_ms(100).await;
        assert!(!engine.panel().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_cancels_pending_hide() {
        let (_, mut engine) = engine();
        engine.input("merge");
        sleep_ms(350).await;

        engine.blur();
        sleep_ms(100).await;
        engine.focus();
        sleep_ms(500).await;
        assert!(engine.panel().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_during_grace_delay_wins() {
        let (_, mut engine) = engine();
        engine.input("merge");
        sleep_ms(350).await;

        engine.blur();
        sleep_ms(50).await;
        assert_eq!(engine.select("merge sort"), "merge sort");
        assert!(!engine.panel().visible);

        // The stale hide must not fire into a later interaction.
        engine.input("linked");
        engine.flush().await;
        sleep_ms(180).await;
        assert!(engine.panel().visible);
    }
}
