//! csq-core: Code search query client library
//!
//! This library owns the canonical search state of a code-search client:
//! encoding it to and from a shareable query string, composing filter
//! updates, debounced suggestions, stale-safe search orchestration against
//! the remote search API, and pagination windows.

pub mod auth;
pub mod client;
pub mod config;
pub mod consts;
pub mod discover;
pub mod filters;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod pagination;
pub mod query;
pub mod session;
pub mod state;
pub mod suggest;
pub mod timer;

pub use auth::CredentialStore;
pub use client::ApiClient;
pub use config::Config;
pub use consts::*;
pub use filters::FilterUpdate;
pub use models::{SearchResultPage, Snippet};
pub use orchestrator::{SearchOrchestrator, SearchStatus, SearchView};
pub use pagination::Pagination;
pub use session::SearchSession;
pub use state::{Complexity, FilterSet, Quality, SearchState};
pub use suggest::{LocalSuggestions, RemoteSuggestions, SuggestionEngine, SuggestionPanel};

#[derive(Debug, thiserror::Error)]
pub enum CsqError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not authenticated (run `csq login`)")]
    Unauthorized,

    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CsqError>;
