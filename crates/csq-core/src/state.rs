//! Canonical search state: query text, filters and page

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Complexity filter. Exactly one value is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[default]
    All,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    pub const ALL: [Complexity; 5] = [
        Complexity::All,
        Complexity::Low,
        Complexity::Medium,
        Complexity::High,
        Complexity::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::All => "all",
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::VeryHigh => "very_high",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Complexity::All
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Complexity::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown complexity: {s}"))
    }
}

/// Quality filter. Exactly one value is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    All,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::All,
        Quality::Excellent,
        Quality::Good,
        Quality::Fair,
        Quality::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::All => "all",
            Quality::Excellent => "excellent",
            Quality::Good => "good",
            Quality::Fair => "fair",
            Quality::Poor => "poor",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Quality::All
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| format!("unknown quality: {s}"))
    }
}

/// The closed set of filters a search can carry.
///
/// Multi-valued filters are ordered sets, so two filter sets holding the same
/// languages in a different insertion order compare equal and hash the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSet {
    /// Selected languages (empty = all languages)
    #[serde(default)]
    pub languages: BTreeSet<String>,

    /// Selected repositories (empty = all repositories)
    #[serde(default)]
    pub repositories: BTreeSet<String>,

    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default)]
    pub quality: Quality,
}

impl FilterSet {
    /// True when no filter narrows the result set.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.repositories.is_empty()
            && self.complexity.is_default()
            && self.quality.is_default()
    }

    /// Number of active filter values, for "N filters" badges.
    pub fn active_count(&self) -> usize {
        self.languages.len()
            + self.repositories.len()
            + usize::from(!self.complexity.is_default())
            + usize::from(!self.quality.is_default())
    }
}

/// The canonical, URL-addressable search state.
///
/// Values are never patched in place by callers: every operation in
/// [`crate::filters`] takes a state and returns a complete new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchState {
    /// Free-text query; empty means no search has been made yet
    #[serde(default)]
    pub query: String,

    /// 1-indexed page, always >= 1
    #[serde(default = "first_page")]
    pub page: u32,

    #[serde(default)]
    pub filters: FilterSet,
}

fn first_page() -> u32 {
    1
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: first_page(),
            filters: FilterSet::default(),
        }
    }
}

impl SearchState {
    /// A page-one state for `query` with no filters.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Whether this state should trigger a search at all.
    pub fn is_searchable(&self) -> bool {
        !self.query.trim().is_empty()
    }
}
