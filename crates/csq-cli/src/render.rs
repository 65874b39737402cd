//! Terminal rendering of search views

use std::path::Path;

use csq_core::{CsqError, Pagination, SearchResultPage, SearchStatus, SearchView, Snippet};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

/// Lines kept at the top and bottom of a collapsed snippet.
const HEAD_LINES: usize = 5;
const TAIL_LINES: usize = 3;

pub struct Renderer {
    highlighter: SyntaxHighlighter,
    collapse_threshold: usize,
}

impl Renderer {
    pub fn new(collapse_threshold: usize) -> Self {
        Self {
            highlighter: SyntaxHighlighter::new(),
            collapse_threshold,
        }
    }

    /// Print whatever the view's status calls for, then the share location.
    pub fn print_view(&self, view: &SearchView, pagination: Option<&Pagination>, location: &str) {
        match view.status() {
            SearchStatus::Idle => println!("Type a query to search."),
            SearchStatus::Loading => println!("Searching..."),
            SearchStatus::Failed => {
                if let Some(error) = &view.error {
                    print_error(error);
                }
                if let Some(page) = &view.results {
                    println!("\x1b[2mShowing previous results\x1b[0m\n");
                    self.print_page(view, page);
                }
            }
            SearchStatus::Empty => {
                println!("No results found for: {}", view.state.query);
                if !view.state.filters.is_empty() {
                    println!(
                        "{} filter(s) active; try removing some (:clear).",
                        view.state.filters.active_count()
                    );
                }
            }
            SearchStatus::Ready => {
                if let Some(page) = &view.results {
                    self.print_page(view, page);
                }
                if let Some(pagination) = pagination {
                    print_pagination(pagination);
                }
            }
        }

        if view.state.is_searchable() {
            println!("\x1b[2mShare: {}\x1b[0m", location);
        }
    }

    fn print_page(&self, view: &SearchView, page: &SearchResultPage) {
        let mut summary = format!("{} results", page.total_results);
        if let Some(seconds) = page.search_time {
            summary.push_str(&format!(", {:.2}s", seconds));
        }
        println!("Results for: {} ({})", view.state.query, summary);

        let filters = &view.state.filters;
        if !filters.is_empty() {
            let mut active: Vec<String> = Vec::new();
            active.extend(filters.languages.iter().map(|l| format!("language={l}")));
            active.extend(filters.repositories.iter().map(|r| format!("repository={r}")));
            if !filters.complexity.is_default() {
                active.push(format!("complexity={}", filters.complexity));
            }
            if !filters.quality.is_default() {
                active.push(format!("quality={}", filters.quality));
            }
            println!("\x1b[2mFilters: {}\x1b[0m", active.join(" "));
        }
        println!();

        self.print_snippets(&page.results);
    }

    pub fn print_snippets(&self, snippets: &[Snippet]) {
        for (i, snippet) in snippets.iter().enumerate() {
            self.print_snippet(i + 1, snippet);
        }
    }

    /// Pretty-print one snippet with syntax highlighting.
    fn print_snippet(&self, index: usize, snippet: &Snippet) {
        let score = match snippet.score {
            Some(score) => {
                let color = if score > 0.7 {
                    "\x1b[32m"
                } else if score > 0.5 {
                    "\x1b[33m"
                } else {
                    "\x1b[31m"
                };
                format!(" {color}{score:.3}\x1b[0m")
            }
            None => String::new(),
        };

        println!(
            "\x1b[1;36m[{}]\x1b[0m{}  \x1b[1m{}\x1b[0m",
            index,
            score,
            snippet.display_title()
        );

        let mut details = Vec::new();
        if !snippet.repository.name.is_empty() {
            details.push(snippet.repository.name.clone());
        }
        if let Some(path) = &snippet.file_path {
            match (snippet.line_start, snippet.line_end) {
                (Some(start), Some(end)) => details.push(format!("{path}:{start}-{end}")),
                _ => details.push(path.clone()),
            }
        }
        if !snippet.language.is_empty() {
            details.push(snippet.language.clone());
        }
        if let Some(complexity) = &snippet.complexity {
            match complexity.as_str() {
                Some(level) => details.push(format!("complexity {level}")),
                None => details.push(format!("complexity {complexity}")),
            }
        }
        if snippet.stars > 0 {
            details.push(format!("★ {}", snippet.stars));
        }
        if !details.is_empty() {
            println!("    \x1b[33m{}\x1b[0m", details.join(" · "));
        }

        let code = format_snippet(snippet, self.collapse_threshold);
        let highlighted =
            self.highlighter
                .highlight(&code, snippet.file_path.as_deref(), &snippet.language);
        println!("{}", highlighted);
        println!();
    }
}

fn print_error(error: &CsqError) {
    match error {
        CsqError::Unauthorized => {
            println!("\x1b[33mNot logged in.\x1b[0m Run 'csq login --token <TOKEN>' and search again.");
        }
        other => println!("\x1b[31mSearch failed:\x1b[0m {}", other),
    }
}

fn print_pagination(pagination: &Pagination) {
    if pagination.total_pages <= 1 {
        return;
    }

    let pages: Vec<String> = pagination
        .window
        .iter()
        .map(|&page| {
            if page == pagination.current {
                format!("\x1b[1;7m {page} \x1b[0m")
            } else {
                format!(" {page} ")
            }
        })
        .collect();

    let previous = if pagination.has_previous { "‹ prev" } else { "\x1b[2m‹ prev\x1b[0m" };
    let next = if pagination.has_next { "next ›" } else { "\x1b[2mnext ›\x1b[0m" };
    println!(
        "{}  {}  {}   (page {} of {})",
        previous,
        pages.join(""),
        next,
        pagination.current,
        pagination.total_pages
    );
}

/// Number the snippet's lines, keeping only the head and tail of a
/// collapsible snippet.
fn format_snippet(snippet: &Snippet, collapse_threshold: usize) -> String {
    let start_line = snippet.line_start.map_or(1, |line| line as usize);
    let lines: Vec<&str> = snippet.content.lines().collect();
    let total = lines.len();
    let collapsed = snippet.is_collapsible(collapse_threshold) && total > HEAD_LINES + TAIL_LINES;

    let mut result = String::new();
    for (i, line) in lines.iter().enumerate() {
        if collapsed && i == HEAD_LINES {
            result.push_str(&format!(
                "\x1b[2m     ┊  ... {} more lines ...\x1b[0m\n",
                total - HEAD_LINES - TAIL_LINES
            ));
        }
        if collapsed && (HEAD_LINES..total - TAIL_LINES).contains(&i) {
            continue;
        }
        result.push_str(&format!("│ {:4} │ {}\n", start_line + i, line));
    }
    result
}

/// Wrapper around syntect for syntax highlighting.
struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl SyntaxHighlighter {
    fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// File extension first, then the language name, then plain text.
    fn syntax_for(&self, file_path: Option<&str>, language: &str) -> &SyntaxReference {
        file_path
            .and_then(|path| Path::new(path).extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.syntax_set.find_syntax_by_extension(ext))
            .or_else(|| self.syntax_set.find_syntax_by_token(language))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn highlight(&self, code: &str, file_path: Option<&str>, language: &str) -> String {
        let Some(theme) = self.theme_set.themes.get("base16-ocean.dark") else {
            return code.to_string();
        };
        let mut highlighter = HighlightLines::new(self.syntax_for(file_path, language), theme);

        let mut output: String = LinesWithEndings::from(code)
            .map(|line| match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => as_24_bit_terminal_escaped(&ranges, false),
                Err(_) => line.to_string(),
            })
            .collect();
        output.push_str("\x1b[0m");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(lines: usize, line_start: Option<u32>) -> Snippet {
        Snippet {
            id: "s1".to_string(),
            content: (1..=lines).map(|i| format!("line {i}\n")).collect(),
            line_start,
            ..Snippet::default()
        }
    }

    #[test]
    fn test_short_snippet_is_shown_in_full() {
        let formatted = format_snippet(&snippet(3, Some(10)), 12);
        assert_eq!(formatted.lines().count(), 3);
        assert!(formatted.starts_with("│   10 │ line 1"));
    }

    #[test]
    fn test_collapsible_snippet_keeps_head_and_tail() {
        let formatted = format_snippet(&snippet(20, None), 12);

        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), HEAD_LINES + 1 + TAIL_LINES);
        assert!(lines[0].ends_with("line 1"));
        assert!(lines[HEAD_LINES - 1].ends_with("line 5"));
        assert!(lines[HEAD_LINES].contains("12 more lines"));
        assert!(lines[HEAD_LINES + 1].contains("  18 │ line 18"));
        assert!(lines[lines.len() - 1].contains("  20 │ line 20"));
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(format_snippet(&snippet(12, None), 12).lines().count(), 12);
        assert_eq!(
            format_snippet(&snippet(13, None), 12).lines().count(),
            HEAD_LINES + 1 + TAIL_LINES
        );
        // Too short to drop anything even with a tiny threshold.
        assert_eq!(format_snippet(&snippet(8, None), 2).lines().count(), 8);
    }

    #[test]
    fn test_syntax_lookup_falls_back() {
        let highlighter = SyntaxHighlighter::new();
        assert_eq!(highlighter.syntax_for(Some("src/lib.rs"), "").name, "Rust");
        assert_eq!(highlighter.syntax_for(None, "python").name, "Python");
        assert_eq!(highlighter.syntax_for(None, "").name, "Plain Text");
    }
}
