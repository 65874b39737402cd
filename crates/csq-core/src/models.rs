//! Wire types exchanged with the search service

use serde::{Deserialize, Serialize};

/// Repository a snippet was found in, as reported by the search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// A single search hit.
///
/// Only `id` and `content` matter to the search core; every other field is
/// for display and tolerated when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub repository: RepositoryRef,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    #[serde(default)]
    pub complexity: Option<serde_json::Value>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub highlighted_content: Option<String>,
}

impl Snippet {
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// Whether the content is long enough to be shown collapsed.
    pub fn is_collapsible(&self, threshold: usize) -> bool {
        self.line_count() > threshold
    }

    /// Title to display, falling back to the file path and then the id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.file_path.as_deref())
            .unwrap_or(&self.id)
    }
}

/// One page of search results. Replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultPage {
    /// Hits in server relevance order
    #[serde(default)]
    pub results: Vec<Snippet>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Server-side search time in seconds
    #[serde(default)]
    pub search_time: Option<f64>,
}

impl SearchResultPage {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Response of the suggestions endpoint. Some deployments return a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionsResponse {
    Wrapped { suggestions: Vec<String> },
    Bare(Vec<String>),
}

impl SuggestionsResponse {
    pub fn into_suggestions(self) -> Vec<String> {
        match self {
            SuggestionsResponse::Wrapped { suggestions } => suggestions,
            SuggestionsResponse::Bare(suggestions) => suggestions,
        }
    }
}

/// A snippet found similar to another one, with its similarity score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimilarSnippet {
    pub snippet: Snippet,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub highlighted_content: Option<String>,
}

impl SimilarSnippet {
    /// The snippet with the similarity score filled in for display.
    pub fn into_snippet(self) -> Snippet {
        let mut snippet = self.snippet;
        snippet.score = Some(self.score);
        if snippet.highlighted_content.is_none() {
            snippet.highlighted_content = self.highlighted_content;
        }
        snippet
    }
}

/// Response of `GET /api/v1/search/similar/{snippet_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarSnippetsResponse {
    #[serde(default)]
    pub snippet_id: String,
    #[serde(default)]
    pub similar_snippets: Vec<SimilarSnippet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryCount {
    pub query: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicGrowth {
    pub topic: String,
    /// Growth in percent over the analysed period
    #[serde(default)]
    pub growth: f64,
}

/// Response of `GET /api/v1/search/trends`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchTrends {
    #[serde(default)]
    pub popular_queries: Vec<QueryCount>,
    #[serde(default)]
    pub popular_languages: Vec<LanguageCount>,
    #[serde(default)]
    pub trending_topics: Vec<TopicGrowth>,
}

/// Filter values the service knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableFilters {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub code_types: Vec<String>,
    #[serde(default)]
    pub complexity_levels: Vec<String>,
    #[serde(default)]
    pub quality_levels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    Pending,
    Indexing,
    Indexed,
    Failed,
    Updating,
    #[serde(other)]
    Unknown,
}

/// An indexed repository as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default = "default_status")]
    pub status: RepositoryStatus,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_snippets: u64,
}

fn default_status() -> RepositoryStatus {
    RepositoryStatus::Pending
}

/// Body of `POST /api/v1/index`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRequest {
    pub url: String,
}

/// Response of `POST /api/v1/index`.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_tolerates_sparse_snippets() {
        let json = r#"{
            "results": [{"id": "s1", "content": "fn main() {}\n"}],
            "total_results": 1,
            "total_pages": 1,
            "has_next_page": false
        }"#;
        let page: SearchResultPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results[0].id, "s1");
        assert_eq!(page.results[0].display_title(), "s1");
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_snippet_collapse_threshold() {
        let snippet = Snippet {
            id: "s".to_string(),
            content: (1..=13).map(|i| format!("line {i}\n")).collect(),
            ..Snippet::default()
        };
        assert_eq!(snippet.line_count(), 13);
        assert!(snippet.is_collapsible(12));
        assert!(!snippet.is_collapsible(13));
    }

    #[test]
    fn test_suggestions_response_shapes() {
        let wrapped: SuggestionsResponse =
            serde_json::from_str(r#"{"query": "sor", "suggestions": ["merge sort"]}"#).unwrap();
        assert_eq!(wrapped.into_suggestions(), vec!["merge sort"]);

        let bare: SuggestionsResponse = serde_json::from_str(r#"["quick sort"]"#).unwrap();
        assert_eq!(bare.into_suggestions(), vec!["quick sort"]);
    }

    #[test]
    fn test_unknown_repository_status() {
        let repo: Repository =
            serde_json::from_str(r#"{"id": "r1", "name": "api", "status": "archived"}"#).unwrap();
        assert_eq!(repo.status, RepositoryStatus::Unknown);
    }
}
