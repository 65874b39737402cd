//! Interactive search session
//!
//! Plain input runs a search; lines starting with `:` change filters,
//! pages and history the same way the search page's controls do.

use std::io::Write;

use anyhow::Result;
use csq_core::{Complexity, FilterUpdate, Quality};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{Session, Workspace, settle};

#[derive(Debug, PartialEq)]
enum ShellCommand {
    Search(String),
    Suggest(String),
    Pick(usize),
    Filter(FilterUpdate),
    Page(u32),
    Next,
    Previous,
    Back,
    Forward,
    Refresh,
    Share,
    Help,
    Quit,
}

fn parse(line: &str) -> std::result::Result<ShellCommand, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(ShellCommand::Search(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let required = |what: &str| {
        if arg.is_empty() {
            Err(format!("Usage: :{name} <{what}>"))
        } else {
            Ok(arg.to_string())
        }
    };

    let parsed = match name {
        "suggest" | "s" => ShellCommand::Suggest(required("text")?),
        "pick" => ShellCommand::Pick(
            required("number")?
                .parse()
                .map_err(|_| format!("Not a suggestion number: {arg}"))?,
        ),
        "lang" | "language" => {
            ShellCommand::Filter(FilterUpdate::ToggleLanguage(required("language")?))
        }
        "repo" | "repository" => {
            ShellCommand::Filter(FilterUpdate::ToggleRepository(required("repository")?))
        }
        "complexity" => ShellCommand::Filter(FilterUpdate::Complexity(
            required("level")?.parse::<Complexity>()?,
        )),
        "quality" => ShellCommand::Filter(FilterUpdate::Quality(
            required("level")?.parse::<Quality>()?,
        )),
        "clear" => ShellCommand::Filter(FilterUpdate::ClearAll),
        "page" | "p" => ShellCommand::Page(
            required("number")?
                .parse()
                .map_err(|_| format!("Not a page number: {arg}"))?,
        ),
        "next" | "n" => ShellCommand::Next,
        "prev" | "previous" => ShellCommand::Previous,
        "back" | "b" => ShellCommand::Back,
        "forward" | "f" => ShellCommand::Forward,
        "refresh" | "r" => ShellCommand::Refresh,
        "share" => ShellCommand::Share,
        "help" | "h" | "?" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command :{other} (try :help)")),
    };
    Ok(parsed)
}

fn print_help() {
    println!("Type a query and press enter to search. Commands:");
    println!("  :suggest <text>    show suggestions for partial input");
    println!("  :pick <n>          search for suggestion n");
    println!("  :lang <name>       toggle a language filter");
    println!("  :repo <name>       toggle a repository filter");
    println!("  :complexity <lvl>  all, low, medium, high, very_high");
    println!("  :quality <lvl>     all, excellent, good, fair, poor");
    println!("  :clear             remove all filters");
    println!("  :next / :prev      move between pages");
    println!("  :page <n>          jump to a page");
    println!("  :back / :forward   move through history");
    println!("  :refresh           fetch the current page again");
    println!("  :share             print the link for this search");
    println!("  :quit              leave");
}

/// Run the REPL until `:quit` or end of input.
pub async fn run(workspace: &Workspace, location: &str) -> Result<()> {
    let mut session = workspace.session(location)?;
    let renderer = workspace.renderer();
    let mut picks: Vec<String> = Vec::new();

    print_help();
    if session.state().is_searchable() {
        settle(&mut session).await?;
        renderer.print_view(&session.view(), session.pagination().as_ref(), session.location());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("csq> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if execute(&mut session, command, &mut picks).await {
            settle(&mut session).await?;
            renderer.print_view(&session.view(), session.pagination().as_ref(), session.location());
        }
    }

    session.close();
    Ok(())
}

/// Apply one command. Returns true when the search state changed.
async fn execute(session: &mut Session, command: ShellCommand, picks: &mut Vec<String>) -> bool {
    match command {
        ShellCommand::Search(text) => {
            session.type_query(&text);
            session.submit();
        }
        ShellCommand::Suggest(text) => {
            session.type_query(&text);
            session.flush_suggestions().await;
            *picks = session.suggestions().items;
            if picks.is_empty() {
                println!("No suggestions.");
            }
            for (i, item) in picks.iter().enumerate() {
                println!("  {}. {}", i + 1, item);
            }
            return false;
        }
        ShellCommand::Pick(n) => {
            let Some(item) = n.checked_sub(1).and_then(|i| picks.get(i)).cloned() else {
                println!("No suggestion {} (run :suggest first).", n);
                return false;
            };
            picks.clear();
            session.select_suggestion(&item);
        }
        ShellCommand::Filter(update) => session.apply(update),
        ShellCommand::Page(page) => session.go_to_page(page),
        ShellCommand::Next => {
            if !session.next_page() {
                println!("Already on the last page.");
                return false;
            }
        }
        ShellCommand::Previous => {
            if !session.previous_page() {
                println!("Already on the first page.");
                return false;
            }
        }
        ShellCommand::Back => {
            if !session.back() {
                println!("Nothing to go back to.");
                return false;
            }
        }
        ShellCommand::Forward => {
            if !session.forward() {
                println!("Nothing to go forward to.");
                return false;
            }
        }
        ShellCommand::Refresh => session.refresh(),
        ShellCommand::Share => {
            println!("{}", session.location());
            return false;
        }
        ShellCommand::Help => {
            print_help();
            return false;
        }
        ShellCommand::Quit => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_searches() {
        assert_eq!(
            parse("  quick sort "),
            Ok(ShellCommand::Search("quick sort".to_string()))
        );
    }

    #[test]
    fn test_filter_commands() {
        assert_eq!(
            parse(":lang rust"),
            Ok(ShellCommand::Filter(FilterUpdate::ToggleLanguage(
                "rust".to_string()
            )))
        );
        assert_eq!(
            parse(":complexity very_high"),
            Ok(ShellCommand::Filter(FilterUpdate::Complexity(
                Complexity::VeryHigh
            )))
        );
        assert_eq!(parse(":clear"), Ok(ShellCommand::Filter(FilterUpdate::ClearAll)));
        assert!(parse(":quality amazing").is_err());
    }

    #[test]
    fn test_navigation_commands() {
        assert_eq!(parse(":page 4"), Ok(ShellCommand::Page(4)));
        assert_eq!(parse(":n"), Ok(ShellCommand::Next));
        assert_eq!(parse(":back"), Ok(ShellCommand::Back));
        assert_eq!(parse(":q"), Ok(ShellCommand::Quit));
        assert!(parse(":page two").is_err());
        assert!(parse(":page").is_err());
        assert!(parse(":jump 3").is_err());
    }
}
