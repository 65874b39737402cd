//! HTTP client for the search service
//!
//! Every request goes through [`ApiClient::execute`], which injects the
//! bearer token, retries once on transport failures and turns a 401 into
//! [`CsqError::Unauthorized`] after clearing the stored token.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::models::{
    AvailableFilters, IndexRequest, IndexResponse, Repository, SearchResultPage, SearchTrends,
    SimilarSnippet, SimilarSnippetsResponse, SuggestionsResponse,
};
use crate::orchestrator::SearchBackend;
use crate::state::SearchState;
use crate::{Config, CredentialStore, CsqError, Result};

/// Thin typed wrapper around `reqwest` for the `/api/v1` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    credentials: CredentialStore,
}

impl ApiClient {
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| CsqError::Config(format!("Invalid api_url {}: {e}", config.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(CsqError::Config(format!(
                "Invalid api_url {}: not a base URL",
                config.api_url
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// `GET /api/v1/search/` for the given state.
    pub async fn search_page(&self, state: &SearchState) -> Result<SearchResultPage> {
        let url = self.endpoint(&["api", "v1", "search", ""])?;
        let params = search_params(state);

        tracing::info!("Searching for {:?} (page {})", state.query, state.page);
        let response = self
            .execute(|| self.http.get(url.clone()).query(&params))
            .await?;
        let page: SearchResultPage = response.json().await?;
        tracing::debug!(
            "Search returned {} of {} results",
            page.results.len(),
            page.total_results
        );
        Ok(page)
    }

    /// `GET /api/v1/search/suggestions?q=&limit=`
    pub async fn suggestions(&self, partial: &str, limit: usize) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "v1", "search", "suggestions"])?;
        let limit = limit.to_string();
        let response = self
            .execute(|| {
                self.http
                    .get(url.clone())
                    .query(&[("q", partial), ("limit", limit.as_str())])
            })
            .await?;
        let body: SuggestionsResponse = response.json().await?;
        Ok(body.into_suggestions())
    }

    /// `GET /api/v1/search/similar/{snippet_id}?limit=&threshold=`
    pub async fn similar_snippets(
        &self,
        snippet_id: &str,
        limit: usize,
        threshold: f64,
    ) -> Result<Vec<SimilarSnippet>> {
        let url = self.endpoint(&["api", "v1", "search", "similar", snippet_id])?;
        let params = [
            ("limit", limit.to_string()),
            ("threshold", threshold.to_string()),
        ];

        tracing::info!("Finding snippets similar to {}", snippet_id);
        let response = self
            .execute(|| self.http.get(url.clone()).query(&params))
            .await?;
        let body: SimilarSnippetsResponse = response.json().await?;
        Ok(body.similar_snippets)
    }

    /// `GET /api/v1/search/trends?days=`
    pub async fn trends(&self, days: u32) -> Result<SearchTrends> {
        let url = self.endpoint(&["api", "v1", "search", "trends"])?;
        let days = days.to_string();
        let response = self
            .execute(|| self.http.get(url.clone()).query(&[("days", days.as_str())]))
            .await?;
        Ok(response.json().await?)
    }

    /// `GET /api/v1/search/filters`
    pub async fn available_filters(&self) -> Result<AvailableFilters> {
        let url = self.endpoint(&["api", "v1", "search", "filters"])?;
        let response = self.execute(|| self.http.get(url.clone())).await?;
        Ok(response.json().await?)
    }

    /// `GET /api/v1/repositories`
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let url = self.endpoint(&["api", "v1", "repositories"])?;
        let response = self.execute(|| self.http.get(url.clone())).await?;
        let body: RepositoryList = response.json().await?;
        Ok(body.into_repositories())
    }

    /// `POST /api/v1/index`. The URL is validated before anything is sent.
    pub async fn index_repository(&self, repository_url: &str) -> Result<IndexResponse> {
        let repository_url = validate_repository_url(repository_url)?;
        let url = self.endpoint(&["api", "v1", "index"])?;
        let body = IndexRequest {
            url: repository_url.to_string(),
        };

        tracing::info!("Requesting indexing of {}", body.url);
        let response = self
            .execute(|| self.http.post(url.clone()).json(&body))
            .await?;
        Ok(response.json().await?)
    }

    /// `DELETE /api/v1/repositories/{id}`
    pub async fn delete_repository(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "v1", "repositories", id])?;
        self.execute(|| self.http.delete(url.clone())).await?;
        tracing::info!("Deleted repository {}", id);
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CsqError::Config(format!("Invalid api_url {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request built by `build`, retrying once on connect/timeout errors.
    async fn execute<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retried = false;
        loop {
            let mut request = build();
            if let Some(token) = self.credentials.token() {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => return self.check_status(response).await,
                Err(e) if !retried && (e.is_connect() || e.is_timeout()) => {
                    tracing::warn!("Request failed ({e}), retrying once");
                    retried = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Search service rejected credentials, clearing stored token");
            self.credentials.clear()?;
            return Err(CsqError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CsqError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }
}

impl SearchBackend for ApiClient {
    async fn search(&self, state: &SearchState) -> Result<SearchResultPage> {
        self.search_page(state).await
    }
}

/// Query parameters for `GET /api/v1/search/`.
///
/// Each language is sent both as `language` and as the list key
/// `languages`, which is the one the search service reads. `repositories`
/// and `quality` go beyond the documented contract; servers that do not
/// know a key ignore it.
pub fn search_params(state: &SearchState) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query", state.query.clone()),
        ("page", state.page.to_string()),
    ];
    for language in &state.filters.languages {
        params.push(("language", language.clone()));
    }
    for language in &state.filters.languages {
        params.push(("languages", language.clone()));
    }
    for repository in &state.filters.repositories {
        params.push(("repositories", repository.clone()));
    }
    if !state.filters.complexity.is_default() {
        params.push(("complexity", state.filters.complexity.to_string()));
    }
    if !state.filters.quality.is_default() {
        params.push(("quality", state.filters.quality.to_string()));
    }
    params
}

/// Check a user-entered repository URL without touching the network.
pub fn validate_repository_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let invalid = |reason: &str| CsqError::InvalidRepositoryUrl(format!("{raw}: {reason}"));

    if raw.is_empty() {
        return Err(invalid("empty"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs are supported"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.path().trim_matches('/').is_empty() {
        return Err(invalid("missing repository path"));
    }
    Ok(url)
}

/// Pull `detail` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepositoryList {
    Wrapped { repositories: Vec<Repository> },
    Bare(Vec<Repository>),
}

impl RepositoryList {
    fn into_repositories(self) -> Vec<Repository> {
        match self {
            RepositoryList::Wrapped { repositories } => repositories,
            RepositoryList::Bare(repositories) => repositories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters;
    use crate::state::Complexity;

    #[test]
    fn test_search_params_follow_contract() {
        let state = SearchState::with_query("quick sort");
        assert_eq!(
            search_params(&state),
            vec![("query", "quick sort".to_string()), ("page", "1".to_string())]
        );

        let state = filters::toggle_language(&state, "rust");
        let state = filters::set_complexity(&state, Complexity::High);
        let params = search_params(&filters::set_page(&state, 2));
        assert!(params.contains(&("language", "rust".to_string())));
        assert!(params.contains(&("languages", "rust".to_string())));
        assert!(params.contains(&("complexity", "high".to_string())));
        assert!(params.contains(&("page", "2".to_string())));
        assert!(!params.iter().any(|(key, _)| *key == "quality"));
    }

    #[test]
    fn test_validate_repository_url() {
        assert!(validate_repository_url("https://github.com/rust-lang/rust").is_ok());
        assert!(validate_repository_url("  http://gitlab.example.com/team/app.git ").is_ok());

        for bad in [
            "",
            "github.com/rust-lang/rust",
            "ftp://example.com/repo",
            "https://github.com",
            "not a url",
        ] {
            assert!(
                matches!(
                    validate_repository_url(bad),
                    Err(CsqError::InvalidRepositoryUrl(_))
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"detail": "Search failed"}"#), "Search failed");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "no details");
    }

    #[test]
    fn test_rejects_invalid_api_url() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            ApiClient::new(&config, CredentialStore::default()),
            Err(CsqError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let config = Config {
            api_url: "http://localhost:8000/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config, CredentialStore::default()).unwrap();
        assert_eq!(
            client.endpoint(&["api", "v1", "search", ""]).unwrap().as_str(),
            "http://localhost:8000/api/v1/search/"
        );
        assert_eq!(
            client
                .endpoint(&["api", "v1", "repositories", "a b"])
                .unwrap()
                .as_str(),
            "http://localhost:8000/api/v1/repositories/a%20b"
        );
    }
}
