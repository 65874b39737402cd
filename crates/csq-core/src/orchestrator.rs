//! Search orchestration: turns state changes into fetches
//!
//! The orchestrator owns the current [`SearchState`] and the view derived
//! from it. Fetches run as spawned tasks keyed by the full state; when one
//! completes its page is cached, but it only reaches the view if its key is
//! still the current one. A slow response for an old query can therefore
//! never overwrite the results of a newer one.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::models::SearchResultPage;
use crate::state::SearchState;
use crate::{CACHE_GC_FACTOR, CsqError, MAX_CACHE_ENTRIES, Result};

/// Anything that can answer a search for a given state.
pub trait SearchBackend: Send + Sync + 'static {
    fn search(&self, state: &SearchState) -> impl Future<Output = Result<SearchResultPage>> + Send;
}

/// Cache and de-duplication key: the complete canonical state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(SearchState);

impl RequestKey {
    pub fn state(&self) -> &SearchState {
        &self.0
    }
}

impl From<&SearchState> for RequestKey {
    fn from(state: &SearchState) -> Self {
        Self(state.clone())
    }
}

/// What a front end renders.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub state: SearchState,
    /// Last page applied for the current search, if any
    pub results: Option<Arc<SearchResultPage>>,
    /// The state `results` was fetched for; differs from `state` while a
    /// new search is loading or after it failed
    pub results_state: Option<SearchState>,
    /// No results to show yet and a request is outstanding
    pub is_loading: bool,
    /// A request for the current state is outstanding (including refreshes)
    pub is_fetching: bool,
    /// Failure of the latest request for the current state
    pub error: Option<Arc<CsqError>>,
}

/// The distinct situations a front end must render differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// No query entered yet
    Idle,
    Loading,
    /// The latest request failed; earlier results may still be shown
    Failed,
    /// The search ran and matched nothing
    Empty,
    Ready,
}

impl SearchView {
    /// Whether `results` belong to the current search. The page is not
    /// compared, so paging keeps its navigation while the next page loads.
    pub fn results_match_state(&self) -> bool {
        self.results.is_some()
            && self.results_state.as_ref().is_some_and(|shown| {
                shown.query == self.state.query && shown.filters == self.state.filters
            })
    }

    pub fn status(&self) -> SearchStatus {
        if !self.state.is_searchable() {
            return SearchStatus::Idle;
        }
        if self.error.is_some() {
            return SearchStatus::Failed;
        }
        match &self.results {
            _ if self.is_loading => SearchStatus::Loading,
            None => SearchStatus::Loading,
            Some(page) if page.is_empty() => SearchStatus::Empty,
            Some(_) => SearchStatus::Ready,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    page: Arc<SearchResultPage>,
    fetched_at: Instant,
    /// Insertion order, for evicting the oldest entries first
    order: u64,
}

#[derive(Debug, Default)]
struct Shared {
    view: SearchView,
    current: Option<RequestKey>,
    in_flight: HashSet<RequestKey>,
    cache: HashMap<RequestKey, CacheEntry>,
    inserted: u64,
}

impl Shared {
    fn cache_page(&mut self, key: RequestKey, page: Arc<SearchResultPage>) {
        self.inserted += 1;
        self.cache.insert(
            key,
            CacheEntry {
                page,
                fetched_at: Instant::now(),
                order: self.inserted,
            },
        );
    }

    /// Drop entries older than `max_age`, then the oldest beyond the size cap.
    fn evict(&mut self, max_age: Duration) {
        let before = self.cache.len();
        self.cache
            .retain(|_, entry| entry.fetched_at.elapsed() < max_age);

        while self.cache.len() > MAX_CACHE_ENTRIES {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|(_, entry)| entry.order)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.cache.remove(&key);
                }
                None => break,
            }
        }

        let evicted = before.saturating_sub(self.cache.len());
        if evicted > 0 {
            tracing::debug!("Evicted {} cached pages", evicted);
        }
    }
}

#[derive(Debug)]
struct Inner {
    shared: Mutex<Shared>,
    updates: watch::Sender<SearchView>,
    /// How long a page stays cached at all, fresh or stale
    cache_time: Duration,
}

impl Inner {
    fn publish(&self, view: &SearchView) {
        self.updates.send_replace(view.clone());
    }

    /// Record a finished fetch; only the current key may touch the view.
    fn complete(&self, key: RequestKey, outcome: Result<SearchResultPage>) {
        let mut shared = self.shared.lock();
        shared.in_flight.remove(&key);
        let is_current = shared.current.as_ref() == Some(&key);

        match outcome {
            Ok(page) => {
                let page = Arc::new(page);
                shared.cache_page(key.clone(), page.clone());
                shared.evict(self.cache_time);
                if !is_current {
                    tracing::debug!("Discarding stale response for {:?}", key.state().query);
                    return;
                }
                shared.view.results = Some(page);
                shared.view.results_state = Some(key.state().clone());
                shared.view.error = None;
            }
            Err(e) => {
                if !is_current {
                    tracing::debug!("Discarding stale failure for {:?}: {e}", key.state().query);
                    return;
                }
                tracing::warn!("Search for {:?} failed: {e}", key.state().query);
                shared.view.error = Some(Arc::new(e));
            }
        }

        shared.view.is_loading = false;
        shared.view.is_fetching = false;
        self.publish(&shared.view);
    }
}

/// Owns the search state and keeps the view consistent with it.
pub struct SearchOrchestrator<B> {
    backend: Arc<B>,
    stale_time: Duration,
    inner: Arc<Inner>,
    tasks: JoinSet<()>,
}

impl<B: SearchBackend> SearchOrchestrator<B> {
    /// `stale_time` is how long a cached page is served without refetching.
    pub fn new(backend: Arc<B>, stale_time: Duration) -> Self {
        let (updates, _) = watch::channel(SearchView::default());
        Self {
            backend,
            stale_time,
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared::default()),
                updates,
                cache_time: stale_time * CACHE_GC_FACTOR,
            }),
            tasks: JoinSet::new(),
        }
    }

    pub fn current_state(&self) -> SearchState {
        self.inner.shared.lock().view.state.clone()
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> SearchView {
        self.inner.shared.lock().view.clone()
    }

    /// Receive every view change.
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.updates.subscribe()
    }

    /// Make `state` current and fetch it unless a fresh page is cached.
    pub fn set_state(&mut self, state: SearchState) {
        self.reap();
        let key = RequestKey::from(&state);

        let fetch = {
            let mut shared = self.inner.shared.lock();
            let shared = &mut *shared;
            shared.evict(self.inner.cache_time);
            shared.view.state = state;
            shared.view.error = None;

            if !key.state().is_searchable() {
                shared.current = None;
                shared.view.results = None;
                shared.view.results_state = None;
                shared.view.is_loading = false;
                shared.view.is_fetching = false;
                self.inner.publish(&shared.view);
                return;
            }

            shared.current = Some(key.clone());
            let in_flight = shared.in_flight.contains(&key);

            let fetch = match shared.cache.get(&key) {
                Some(entry) if entry.fetched_at.elapsed() < self.stale_time => {
                    tracing::debug!("Serving {:?} from cache", key.state().query);
                    shared.view.results = Some(entry.page.clone());
                    shared.view.results_state = Some(key.state().clone());
                    shared.view.is_loading = false;
                    shared.view.is_fetching = in_flight;
                    false
                }
                Some(entry) => {
                    tracing::debug!("Cached {:?} is stale, refreshing", key.state().query);
                    shared.view.results = Some(entry.page.clone());
                    shared.view.results_state = Some(key.state().clone());
                    shared.view.is_loading = false;
                    shared.view.is_fetching = true;
                    true
                }
                None => {
                    shared.view.is_loading = true;
                    shared.view.is_fetching = true;
                    true
                }
            };

            self.inner.publish(&shared.view);
            fetch && !in_flight
        };

        if fetch {
            self.spawn_fetch(key);
        } else {
            tracing::debug!("Request for {:?} already satisfied", key.state().query);
        }
    }

    /// Drop the cached page for the current state and fetch it again.
    pub fn refresh(&mut self) {
        let key = {
            let mut shared = self.inner.shared.lock();
            let Some(key) = shared.current.clone() else {
                return;
            };
            shared.cache.remove(&key);
            if shared.in_flight.contains(&key) {
                return;
            }
            shared.view.is_loading = shared.view.results.is_none();
            shared.view.is_fetching = true;
            self.inner.publish(&shared.view);
            key
        };
        self.spawn_fetch(key);
    }

    /// Wait until every outstanding fetch has completed.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    tracing::warn!("Search task panicked: {e}");
                }
            }
        }
    }

    /// Abort every outstanding fetch; nothing started so far will apply.
    pub fn shutdown(&mut self) {
        self.tasks.abort_all();
        let mut shared = self.inner.shared.lock();
        shared.current = None;
        shared.in_flight.clear();
        shared.view.is_loading = false;
        shared.view.is_fetching = false;
        self.inner.publish(&shared.view);
    }

    fn spawn_fetch(&mut self, key: RequestKey) {
        {
            let mut shared = self.inner.shared.lock();
            if !shared.in_flight.insert(key.clone()) {
                return;
            }
        }

        let backend = self.backend.clone();
        let inner = self.inner.clone();
        self.tasks.spawn(async move {
            let outcome = backend.search(key.state()).await;
            inner.complete(key, outcome);
        });
    }

    /// Collect finished tasks so the join set does not grow without bound.
    fn reap(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }
}
