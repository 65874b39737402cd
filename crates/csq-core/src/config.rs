//! Configuration handling for config.json

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_API_URL, DEFAULT_BLUR_GRACE_MS, DEFAULT_CACHE_STALE_SECS,
    DEFAULT_COLLAPSE_THRESHOLD_LINES, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_VISIBLE_PAGES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SUGGESTION_LIMIT, Result, discover,
};

/// Where suggestions come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionMode {
    /// Filter a built-in candidate pool locally
    #[default]
    Local,
    /// Ask the search service
    Remote,
}

/// Configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the search service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Input must be idle this long before suggestions are recomputed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Delay between losing focus and hiding suggestions
    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,

    /// How long a cached results page is served without refetching
    #[serde(default = "default_cache_stale_secs")]
    pub cache_stale_secs: u64,

    /// Maximum number of suggestions shown
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Local candidate pool or remote suggestions endpoint
    #[serde(default)]
    pub suggestion_mode: SuggestionMode,

    /// Number of page links in the pagination window
    #[serde(default = "default_max_visible_pages")]
    pub max_visible_pages: u32,

    /// Snippets longer than this many lines are shown truncated
    #[serde(default = "default_collapse_threshold_lines")]
    pub collapse_threshold_lines: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_blur_grace_ms() -> u64 {
    DEFAULT_BLUR_GRACE_MS
}

fn default_cache_stale_secs() -> u64 {
    DEFAULT_CACHE_STALE_SECS
}

fn default_suggestion_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

fn default_max_visible_pages() -> u32 {
    DEFAULT_MAX_VISIBLE_PAGES
}

fn default_collapse_threshold_lines() -> usize {
    DEFAULT_COLLAPSE_THRESHOLD_LINES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            blur_grace_ms: default_blur_grace_ms(),
            cache_stale_secs: default_cache_stale_secs(),
            suggestion_limit: default_suggestion_limit(),
            suggestion_mode: SuggestionMode::default(),
            max_visible_pages: default_max_visible_pages(),
            collapse_threshold_lines: default_collapse_threshold_lines(),
        }
    }
}

impl Config {
    /// Load config from a config directory, then apply environment overrides.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(dir)?;
        config.apply_env();
        Ok(config)
    }

    /// Load config.json from `dir`, or defaults when it does not exist.
    pub fn load_file(dir: &Path) -> Result<Self> {
        let path = discover::config_path(dir);
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a config directory, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = discover::config_path(dir);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from `CSQ_API_URL` and `CSQ_SUGGESTION_MODE`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CSQ_API_URL") {
            self.api_url = url;
        }
        if let Ok(mode) = std::env::var("CSQ_SUGGESTION_MODE") {
            match mode.to_lowercase().as_str() {
                "local" => self.suggestion_mode = SuggestionMode::Local,
                "remote" => self.suggestion_mode = SuggestionMode::Remote,
                other => tracing::warn!("Ignoring unknown CSQ_SUGGESTION_MODE: {}", other),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }

    pub fn cache_stale_time(&self) -> Duration {
        Duration::from_secs(self.cache_stale_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.cache_stale_time(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            discover::config_path(dir.path()),
            r#"{"api_url": "https://search.example.com", "suggestion_mode": "remote"}"#,
        )
        .unwrap();

        let config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.api_url, "https://search.example.com");
        assert_eq!(config.suggestion_mode, SuggestionMode::Remote);
        assert_eq!(config.suggestion_limit, 5);
        assert_eq!(config.blur_grace(), Duration::from_millis(200));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join(".csq");
        let config = Config {
            max_visible_pages: 7,
            ..Config::default()
        };
        config.save(&nested).unwrap();
        assert_eq!(Config::load_file(&nested).unwrap(), config);
    }
}
