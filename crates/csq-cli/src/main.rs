//! csq CLI: code search from the terminal

mod render;
mod shell;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csq_core::config::SuggestionMode;
use csq_core::suggest::{self, SuggestionSource};
use csq_core::{
    ApiClient, Complexity, Config, CredentialStore, DEFAULT_SIMILAR_LIMIT,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TRENDS_DAYS, LocalSuggestions, Quality,
    RemoteSuggestions, SEARCH_PATH, SUGGESTION_MIN_CHARS, SearchOrchestrator, SearchSession,
    SearchState, SuggestionEngine, discover, filters, query,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::render::Renderer;

#[derive(Parser)]
#[command(name = "csq")]
#[command(about = "Search a code-search service from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project-local .csq config
    Init,

    /// Show configuration and login state
    Status,

    /// Search for code snippets
    Search {
        /// Search query
        query: Vec<String>,

        /// Only show snippets in this language (repeatable)
        #[arg(short, long = "language")]
        languages: Vec<String>,

        /// Only show snippets from this repository (repeatable)
        #[arg(short, long = "repository")]
        repositories: Vec<String>,

        /// Complexity level (low, medium, high, very_high)
        #[arg(long)]
        complexity: Option<Complexity>,

        /// Quality level (excellent, good, fair, poor)
        #[arg(long)]
        quality: Option<Quality>,

        /// Results page
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Run the search described by a shared link
    Open {
        /// Link or location, e.g. /search?q=quick+sort&page=2
        url: String,
    },

    /// Find snippets similar to the given snippet
    Similar {
        /// Snippet id as shown in search results
        snippet_id: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = DEFAULT_SIMILAR_LIMIT)]
        limit: usize,

        /// Minimum similarity score
        #[arg(short, long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
    },

    /// Show popular queries, languages and trending topics
    Trends {
        /// Number of days to analyse
        #[arg(short, long, default_value_t = DEFAULT_TRENDS_DAYS)]
        days: u32,
    },

    /// Show query suggestions for partial input
    Suggest {
        text: Vec<String>,
    },

    /// List the filter values the service knows about
    Filters,

    /// Manage indexed repositories
    Repos {
        #[command(subcommand)]
        action: RepoCommand,
    },

    /// Store an API token
    Login {
        /// Token to store (read from stdin when omitted)
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget the stored API token
    Logout,

    /// Interactive search session
    Shell {
        /// Initial query
        query: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RepoCommand {
    /// List indexed repositories
    List,

    /// Submit a repository for indexing
    Add {
        /// Repository URL, e.g. https://github.com/owner/name
        url: String,
    },

    /// Remove a repository from the index
    Remove {
        /// Repository id as shown by `csq repos list`
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => cmd_init()?,
        Some(Commands::Status) => cmd_status()?,
        Some(Commands::Search {
            query,
            languages,
            repositories,
            complexity,
            quality,
            page,
        }) => {
            let state = build_state(
                &query.join(" "),
                &languages,
                &repositories,
                complexity,
                quality,
                page,
            );
            cmd_search(&query::to_location(SEARCH_PATH, &state)).await?;
        }
        Some(Commands::Open { url }) => cmd_search(&url).await?,
        Some(Commands::Similar {
            snippet_id,
            limit,
            threshold,
        }) => cmd_similar(&snippet_id, limit, threshold).await?,
        Some(Commands::Trends { days }) => cmd_trends(days).await?,
        Some(Commands::Suggest { text }) => cmd_suggest(&text.join(" ")).await?,
        Some(Commands::Filters) => cmd_filters().await?,
        Some(Commands::Repos { action }) => cmd_repos(action).await?,
        Some(Commands::Login { token }) => cmd_login(token)?,
        Some(Commands::Logout) => cmd_logout()?,
        Some(Commands::Shell { query }) => {
            let state = filters::set_query(&SearchState::default(), &query.join(" "));
            let workspace = Workspace::load()?;
            shell::run(&workspace, &query::to_location(SEARCH_PATH, &state)).await?;
        }
        None => {
            if cli.query.is_empty() {
                println!("Usage: csq <query> or csq <command>");
                println!("Run 'csq --help' for more information.");
            } else {
                let state = filters::set_query(&SearchState::default(), &cli.query.join(" "));
                cmd_search(&query::to_location(SEARCH_PATH, &state)).await?;
            }
        }
    }

    Ok(())
}

/// Suggestion source selected by `suggestion_mode`.
enum Suggestions {
    Local(LocalSuggestions),
    Remote(RemoteSuggestions),
}

impl SuggestionSource for Suggestions {
    async fn suggest(&self, input: &str, limit: usize) -> csq_core::Result<Vec<String>> {
        match self {
            Suggestions::Local(source) => source.suggest(input, limit).await,
            Suggestions::Remote(source) => source.suggest(input, limit).await,
        }
    }
}

type Session = SearchSession<ApiClient, Suggestions>;

/// Config directory, settings and credentials for the current directory.
struct Workspace {
    dir: PathBuf,
    config: Config,
    credentials: CredentialStore,
}

impl Workspace {
    fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let dir = discover::config_dir(&cwd)?;
        let config = Config::load(&dir)
            .with_context(|| format!("Failed to load config from {}", dir.display()))?;
        let credentials = CredentialStore::open(&dir)?;

        Ok(Self {
            dir,
            config,
            credentials,
        })
    }

    fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.config, self.credentials.clone())?)
    }

    fn suggestions(&self) -> Result<SuggestionEngine<Suggestions>> {
        let source = match self.config.suggestion_mode {
            SuggestionMode::Local => Suggestions::Local(LocalSuggestions::default()),
            SuggestionMode::Remote => Suggestions::Remote(RemoteSuggestions::new(self.client()?)),
        };
        Ok(SuggestionEngine::new(
            Arc::new(source),
            self.config.suggestion_limit,
            self.config.debounce(),
            self.config.blur_grace(),
        ))
    }

    /// Open a search session at `location` and start its search.
    fn session(&self, location: &str) -> Result<Session> {
        let orchestrator =
            SearchOrchestrator::new(Arc::new(self.client()?), self.config.cache_stale_time());
        Ok(SearchSession::from_location(
            location,
            orchestrator,
            self.suggestions()?,
            self.config.max_visible_pages,
        ))
    }

    fn renderer(&self) -> Renderer {
        Renderer::new(self.config.collapse_threshold_lines)
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

/// Wait for outstanding searches behind a spinner.
async fn settle(session: &mut Session) -> Result<()> {
    if !session.view().is_fetching {
        return Ok(());
    }
    let pb = spinner("Searching...")?;
    session.settle().await;
    pb.finish_and_clear();
    Ok(())
}

/// Build a state from command-line flags through the filter operations.
fn build_state(
    text: &str,
    languages: &[String],
    repositories: &[String],
    complexity: Option<Complexity>,
    quality: Option<Quality>,
    page: u32,
) -> SearchState {
    let mut state = filters::set_query(&SearchState::default(), text);
    for language in languages {
        if !state.filters.languages.contains(language.trim()) {
            state = filters::toggle_language(&state, language);
        }
    }
    for repository in repositories {
        if !state.filters.repositories.contains(repository.trim()) {
            state = filters::toggle_repository(&state, repository);
        }
    }
    if let Some(complexity) = complexity {
        state = filters::set_complexity(&state, complexity);
    }
    if let Some(quality) = quality {
        state = filters::set_quality(&state, quality);
    }
    filters::set_page(&state, page)
}

fn cmd_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let dir = discover::csq_dir(&cwd);

    if dir.exists() {
        anyhow::bail!("Already initialized: {} exists", dir.display());
    }

    Config::default().save(&dir)?;

    println!("Initialized csq config in {}", dir.display());
    println!(
        "Edit {} to point csq at your search service.",
        discover::config_path(&dir).display()
    );

    Ok(())
}

fn cmd_status() -> Result<()> {
    let workspace = Workspace::load()?;
    let config = &workspace.config;
    let mode = match config.suggestion_mode {
        SuggestionMode::Local => "local",
        SuggestionMode::Remote => "remote",
    };

    println!("csq config: {}", workspace.dir.display());
    println!();
    println!("Service:");
    println!("  API URL: {}", config.api_url);
    println!("  Request timeout: {}s", config.request_timeout_secs);
    println!(
        "  Logged in: {}",
        if workspace.credentials.is_logged_in() { "yes" } else { "no" }
    );
    println!();
    println!("Search:");
    println!("  Cache stale time: {}s", config.cache_stale_secs);
    println!("  Visible pages: {}", config.max_visible_pages);
    println!("  Collapse above: {} lines", config.collapse_threshold_lines);
    println!();
    println!("Suggestions:");
    println!("  Mode: {}", mode);
    println!("  Limit: {}", config.suggestion_limit);
    println!("  Debounce: {}ms", config.debounce_ms);

    Ok(())
}

async fn cmd_search(location: &str) -> Result<()> {
    let workspace = Workspace::load()?;
    let mut session = workspace.session(location)?;

    if !session.state().is_searchable() {
        println!("Nothing to search for in: {}", location);
        return Ok(());
    }

    settle(&mut session).await?;
    let view = session.view();
    session.close();

    if let Some(error) = view.error {
        return Err(error.into());
    }

    workspace
        .renderer()
        .print_view(&view, session.pagination().as_ref(), session.location());
    Ok(())
}

async fn cmd_similar(snippet_id: &str, limit: usize, threshold: f64) -> Result<()> {
    let workspace = Workspace::load()?;
    let client = workspace.client()?;

    let pb = spinner("Finding similar snippets...")?;
    let similar = client.similar_snippets(snippet_id, limit, threshold).await;
    pb.finish_and_clear();

    let snippets: Vec<_> = similar?
        .into_iter()
        .map(|similar| similar.into_snippet())
        .collect();
    if snippets.is_empty() {
        println!("No similar snippets found.");
        return Ok(());
    }

    println!("Snippets similar to {}:\n", snippet_id);
    workspace.renderer().print_snippets(&snippets);

    Ok(())
}

async fn cmd_trends(days: u32) -> Result<()> {
    let workspace = Workspace::load()?;
    let trends = workspace.client()?.trends(days).await?;

    println!("Search trends (last {} days):", days);
    println!();
    println!("Popular queries:");
    for entry in &trends.popular_queries {
        println!("  {:<30} {:>6}", entry.query, entry.count);
    }
    println!();
    println!("Popular languages:");
    for entry in &trends.popular_languages {
        println!("  {:<30} {:>6}", entry.language, entry.count);
    }
    println!();
    println!("Trending topics:");
    for entry in &trends.trending_topics {
        println!("  {:<30} {:>+5}%", entry.topic, entry.growth);
    }

    Ok(())
}

async fn cmd_suggest(text: &str) -> Result<()> {
    if !suggest::is_active(text) {
        println!(
            "Type more than {} characters to get suggestions.",
            SUGGESTION_MIN_CHARS
        );
        return Ok(());
    }

    let workspace = Workspace::load()?;
    let mut engine = workspace.suggestions()?;
    engine.input(text);
    engine.flush().await;

    let panel = engine.panel();
    if panel.items.is_empty() {
        println!("No suggestions for: {}", text);
    }
    for item in &panel.items {
        println!("{}", item);
    }

    Ok(())
}

async fn cmd_filters() -> Result<()> {
    let workspace = Workspace::load()?;
    let available = workspace.client()?.available_filters().await?;

    let complexity_levels = if available.complexity_levels.is_empty() {
        Complexity::ALL.iter().map(|c| c.to_string()).collect()
    } else {
        available.complexity_levels
    };
    let quality_levels = if available.quality_levels.is_empty() {
        Quality::ALL.iter().map(|q| q.to_string()).collect()
    } else {
        available.quality_levels
    };

    println!("Languages:  {}", available.languages.join(", "));
    println!("Complexity: {}", complexity_levels.join(", "));
    println!("Quality:    {}", quality_levels.join(", "));
    if !available.code_types.is_empty() {
        println!("Code types: {}", available.code_types.join(", "));
    }

    Ok(())
}

async fn cmd_repos(action: RepoCommand) -> Result<()> {
    let workspace = Workspace::load()?;
    let client = workspace.client()?;

    match action {
        RepoCommand::List => {
            let repositories = client.list_repositories().await?;
            if repositories.is_empty() {
                println!("No repositories indexed yet. Add one with 'csq repos add <url>'.");
                return Ok(());
            }

            println!(
                "{:<38} {:<32} {:<10} {:>8}",
                "ID", "NAME", "STATUS", "SNIPPETS"
            );
            for repository in &repositories {
                let name = repository
                    .full_name
                    .as_deref()
                    .unwrap_or(&repository.name);
                println!(
                    "{:<38} {:<32} {:<10} {:>8}",
                    repository.id,
                    name,
                    format!("{:?}", repository.status).to_lowercase(),
                    repository.total_snippets
                );
            }
        }
        RepoCommand::Add { url } => {
            let repository_url = csq_core::client::validate_repository_url(&url)?;
            let pb = spinner(&format!("Submitting {}...", repository_url))?;
            let response = client.index_repository(repository_url.as_str()).await;
            pb.finish_and_clear();

            let response = response?;
            println!(
                "✓ {}",
                response.message.as_deref().unwrap_or("Indexing started")
            );
            if let Some(id) = response.repository_id {
                println!("  Repository id: {}", id);
            }
        }
        RepoCommand::Remove { id } => {
            client.delete_repository(&id).await?;
            println!("✓ Removed repository {}", id);
        }
    }

    Ok(())
}

fn cmd_login(token: Option<String>) -> Result<()> {
    let workspace = Workspace::load()?;

    let token = match token {
        Some(token) => token,
        None => {
            print!("API token: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line
        }
    };
    if token.trim().is_empty() {
        anyhow::bail!("No token given");
    }

    workspace.credentials.save(&token)?;
    println!(
        "Saved token to {}",
        discover::token_path(&workspace.dir).display()
    );

    Ok(())
}

fn cmd_logout() -> Result<()> {
    let workspace = Workspace::load()?;
    if !workspace.credentials.is_logged_in() {
        println!("Not logged in.");
        return Ok(());
    }
    workspace.credentials.clear()?;
    println!("Logged out.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_from_flags() {
        let state = build_state(
            " quick sort ",
            &["rust".to_string(), "go".to_string(), "rust".to_string()],
            &["acme/api".to_string()],
            Some(Complexity::High),
            None,
            3,
        );

        assert_eq!(state.query, "quick sort");
        assert_eq!(state.page, 3);
        assert_eq!(state.filters.languages.len(), 2);
        assert!(state.filters.repositories.contains("acme/api"));
        assert_eq!(state.filters.complexity, Complexity::High);
        assert_eq!(
            query::to_location(SEARCH_PATH, &state),
            "/search?q=quick+sort&languages=go&languages=rust&repositories=acme%2Fapi&complexity=high&page=3"
        );
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "csq",
            "search",
            "binary",
            "tree",
            "-l",
            "rust",
            "--complexity",
            "very_high",
            "-p",
            "2",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Search {
                query,
                languages,
                complexity,
                page,
                ..
            }) => {
                assert_eq!(query, vec!["binary", "tree"]);
                assert_eq!(languages, vec!["rust"]);
                assert_eq!(complexity, Some(Complexity::VeryHigh));
                assert_eq!(page, 2);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_parses_similar() {
        let cli = Cli::try_parse_from(["csq", "similar", "s42", "-n", "3"]).unwrap();
        match cli.command {
            Some(Commands::Similar {
                snippet_id,
                limit,
                threshold,
            }) => {
                assert_eq!(snippet_id, "s42");
                assert_eq!(limit, 3);
                assert_eq!(threshold, DEFAULT_SIMILARITY_THRESHOLD);
            }
            _ => panic!("expected similar command"),
        }
    }
}
