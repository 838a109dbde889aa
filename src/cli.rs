// Text rendering and the interactive browse loop used by the binary.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::feed::{SearchSnapshot, TrackedSnapshot};
use crate::models::{ExternalJob, JobId, JobStatus};
use crate::screen::{JobCard, Notice, SavedScreen, SearchScreen};

const HELP: &str = "\
Search view:  k <keyword> | / (search) | n (next) | p (prev)
              save <n> | apply <n> | open <n>
Saved view:   saved | applied | delete <id> | apply <id> | open <id> | back
Anywhere:     help | q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Keyword(String),
    Search,
    Next,
    Prev,
    /// The number is a 1-based position in the search view and a job id in
    /// the saved view.
    Save(u64),
    Apply(u64),
    Open(u64),
    Delete(u64),
    Show(JobStatus),
    Back,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let number = || -> Result<u64, String> {
        match rest.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(format!("Expected a number, got '{rest}'")),
        }
    };

    match word {
        "k" | "keyword" => Ok(BrowseCommand::Keyword(rest.to_string())),
        "/" | "search" if rest.is_empty() => Ok(BrowseCommand::Search),
        "/" | "search" => Ok(BrowseCommand::Keyword(rest.to_string())),
        "n" | "next" => Ok(BrowseCommand::Next),
        "p" | "prev" => Ok(BrowseCommand::Prev),
        "save" => number().map(BrowseCommand::Save),
        "apply" => number().map(BrowseCommand::Apply),
        "open" => number().map(BrowseCommand::Open),
        "delete" | "rm" => number().map(BrowseCommand::Delete),
        "saved" => Ok(BrowseCommand::Show(JobStatus::Saved)),
        "applied" => Ok(BrowseCommand::Show(JobStatus::Applied)),
        "back" | "b" => Ok(BrowseCommand::Back),
        "help" | "?" => Ok(BrowseCommand::Help),
        "q" | "quit" | "exit" => Ok(BrowseCommand::Quit),
        "" => Err(String::new()),
        other => Err(format!("Unknown command '{other}' (try 'help')")),
    }
}

fn describe(job: &ExternalJob) -> (String, String) {
    let title = job.title.clone().unwrap_or_else(|| "(no title)".to_string());
    let company = job
        .company
        .clone()
        .unwrap_or_else(|| "(company unknown)".to_string());
    let location = job.location.clone().unwrap_or_else(|| "-".to_string());
    (title, format!("{company} · {location}"))
}

pub fn render_search(snapshot: &SearchSnapshot, cards: &[JobCard]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Search: \"{}\"", snapshot.keyword);

    let prev = if snapshot.can_prev() { "[p] Prev" } else { " -  Prev" };
    let next = if snapshot.can_next() { "[n] Next" } else { " -  Next" };
    let _ = writeln!(out, "{prev}   {}   {next}", snapshot.page_label());

    if snapshot.busy {
        let _ = writeln!(out, "Searching...");
    }
    if snapshot.stale {
        let _ = writeln!(out, "Search changed; press / to run it.");
    }
    if let Some(err) = &snapshot.error {
        let _ = writeln!(out, "Error: {err}");
    }
    if let Some(msg) = snapshot.empty_message() {
        let _ = writeln!(out, "{msg}");
    }

    for (i, card) in cards.iter().enumerate() {
        let (title, sub) = describe(&card.job);
        let state = match card.busy {
            Some(m) => m.label(),
            None if card.can_apply() => "save | apply | open",
            None => "save",
        };
        let _ = writeln!(out, "{:>3}. {title}\n     {sub}\n     [{state}]", i + 1);
    }
    out
}

pub fn render_tracked(snapshot: &TrackedSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.title());
    if snapshot.busy {
        let _ = writeln!(out, "Loading...");
    }
    if let Some(err) = &snapshot.error {
        let _ = writeln!(out, "Error: {err}");
    }
    if let Some(msg) = snapshot.empty_message() {
        let _ = writeln!(out, "{msg}");
    }
    for job in &snapshot.items {
        let (title, sub) = describe(&job.as_external());
        let applied = job
            .applied_date
            .map(|d| format!(" (applied {d})"))
            .unwrap_or_default();
        let _ = writeln!(out, "#{:<5} {title}{applied}\n       {sub}", job.id);
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    format!("{}: {}", notice.title, notice.body)
}

fn index(n: u64) -> usize {
    usize::try_from(n.saturating_sub(1)).unwrap_or(usize::MAX)
}

fn job_id(n: u64) -> JobId {
    JobId(i64::try_from(n).unwrap_or(i64::MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Search,
    Tracked,
}

/// Read commands from stdin and drive both screens until `q` or EOF.
pub async fn browse(search: SearchScreen, saved: SavedScreen) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = View::Search;

    println!("{HELP}\n");
    if let Some(notice) = search.search().await {
        println!("{}", render_notice(&notice));
    }
    println!("{}", render_search(&search.feed().snapshot(), &search.cards()));

    while let Some(line) = lines.next_line().await? {
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                if !msg.is_empty() {
                    println!("{msg}");
                }
                continue;
            }
        };

        let notice = match (view, cmd) {
            (_, BrowseCommand::Quit) => break,
            (_, BrowseCommand::Help) => {
                println!("{HELP}");
                continue;
            }
            (_, BrowseCommand::Show(status)) => {
                let entering = view == View::Search;
                view = View::Tracked;
                if entering && saved.feed().filter() == status {
                    saved.mount().await
                } else {
                    saved.show(status).await
                }
            }
            (View::Tracked, BrowseCommand::Back) => {
                view = View::Search;
                None
            }
            (View::Tracked, BrowseCommand::Apply(id)) => Some(saved.apply(job_id(id)).await),
            (View::Tracked, BrowseCommand::Open(id)) => saved.open(job_id(id)).await,
            (View::Tracked, BrowseCommand::Delete(id)) => Some(saved.delete(job_id(id)).await),
            (View::Tracked, _) => {
                println!("Not available in this view (try 'back')");
                continue;
            }
            (View::Search, BrowseCommand::Keyword(k)) => {
                search.feed().set_keyword(&k);
                search.search().await
            }
            (View::Search, BrowseCommand::Search) => search.search().await,
            (View::Search, BrowseCommand::Next) => search.next_page().await,
            (View::Search, BrowseCommand::Prev) => search.prev_page().await,
            (View::Search, BrowseCommand::Save(n)) => Some(search.save(index(n)).await),
            (View::Search, BrowseCommand::Apply(n)) => Some(search.apply(index(n)).await),
            (View::Search, BrowseCommand::Open(n)) => search.open(index(n)).await,
            (View::Search, BrowseCommand::Delete(_) | BrowseCommand::Back) => {
                println!("Not available in this view (try 'saved')");
                continue;
            }
        };

        if let Some(notice) = notice {
            println!("{}", render_notice(&notice));
        }
        match view {
            View::Search => println!("{}", render_search(&search.feed().snapshot(), &search.cards())),
            View::Tracked => println!("{}", render_tracked(&saved.feed().snapshot())),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Mutation;
    use crate::models::JobKey;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("k rust"), Ok(BrowseCommand::Keyword("rust".into())));
        assert_eq!(parse_command("  /  "), Ok(BrowseCommand::Search));
        assert_eq!(
            parse_command("search data engineer"),
            Ok(BrowseCommand::Keyword("data engineer".into()))
        );
        assert_eq!(parse_command("save 2"), Ok(BrowseCommand::Save(2)));
        assert_eq!(parse_command("rm 7"), Ok(BrowseCommand::Delete(7)));
        assert_eq!(parse_command("applied"), Ok(BrowseCommand::Show(JobStatus::Applied)));
        assert_eq!(parse_command(""), Err(String::new()));
        assert!(parse_command("save 0").is_err());
        assert!(parse_command("apply x").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(index(1), 0);
        assert_eq!(index(3), 2);
        assert_eq!(job_id(7), JobId(7));
    }

    #[test]
    fn search_render_shows_page_and_empty_state() {
        let snapshot = SearchSnapshot {
            keyword: "software engineer".into(),
            page: 2,
            has_searched: true,
            stale: false,
            busy: false,
            error: None,
            items: vec![],
        };
        let out = render_search(&snapshot, &[]);
        assert!(out.contains("Page 2"));
        assert!(out.contains("[p] Prev"));
        assert!(out.contains("No results on this page."));
    }

    #[test]
    fn busy_card_shows_its_mutation() {
        let job = ExternalJob {
            title: Some("Engineer".into()),
            company: None,
            location: None,
            apply_url: Some("https://x/1".into()),
        };
        let snapshot = SearchSnapshot {
            keyword: "rust".into(),
            page: 1,
            has_searched: true,
            stale: false,
            busy: false,
            error: None,
            items: vec![job.clone()],
        };
        let card = JobCard {
            key: JobKey::of(&job),
            job,
            busy: Some(Mutation::Saving),
        };
        let out = render_search(&snapshot, &[card]);
        assert!(out.contains("  1. Engineer"));
        assert!(out.contains("(company unknown)"));
        assert!(out.contains("[Saving...]"));
        assert!(out.contains(" -  Prev"));
    }

    #[test]
    fn stale_results_are_flagged() {
        let snapshot = SearchSnapshot {
            keyword: "data engineer".into(),
            page: 1,
            has_searched: true,
            stale: true,
            busy: false,
            error: None,
            items: vec![],
        };
        let out = render_search(&snapshot, &[]);
        assert!(out.contains("Search changed; press / to run it."));
        assert!(!out.contains("No results on this page."));
    }
}
