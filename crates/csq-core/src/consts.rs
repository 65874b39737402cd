/// The name of the project-local csq folder (like .git)
pub const CSQ_DIR: &str = ".csq";

/// Default base URL of the search service
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default idle window before suggestions are recomputed
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default delay before a blurred input hides its suggestions
pub const DEFAULT_BLUR_GRACE_MS: u64 = 200;

/// Default time a cached results page counts as fresh (5 minutes)
pub const DEFAULT_CACHE_STALE_SECS: u64 = 300;

/// Default maximum number of suggestions shown
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Suggestions activate once the input is longer than this many characters
pub const SUGGESTION_MIN_CHARS: usize = 2;

/// Default number of page links in the pagination window
pub const DEFAULT_MAX_VISIBLE_PAGES: u32 = 5;

/// Snippets with more content lines than this are collapsed by default
pub const DEFAULT_COLLAPSE_THRESHOLD_LINES: usize = 12;

/// Path used when rendering a search location
pub const SEARCH_PATH: &str = "/search";

/// Cached pages are dropped once older than this many stale windows
pub const CACHE_GC_FACTOR: u32 = 3;

/// Upper bound on cached result pages per orchestrator
pub const MAX_CACHE_ENTRIES: usize = 200;

/// Default number of similar snippets requested
pub const DEFAULT_SIMILAR_LIMIT: usize = 10;

/// Default minimum similarity score for similar snippets
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Default number of days analysed for search trends
pub const DEFAULT_TRENDS_DAYS: u32 = 7;
