use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobtracker_client::actions::{Coordinator, LinkOpener, PrintOpener, SystemOpener};
use jobtracker_client::api::{HttpJobApi, JobApi};
use jobtracker_client::cli;
use jobtracker_client::config::{Command, Config, JobArgs};
use jobtracker_client::feed::{FetchOutcome, SearchFeed, TrackedFeed};
use jobtracker_client::models::{ExternalJob, JobId, JobStatus};
use jobtracker_client::screen::{JobCard, Notice, SavedScreen, SearchScreen};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobtracker_client=info,jobtracker=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn external(args: JobArgs) -> ExternalJob {
    ExternalJob {
        title: args.title,
        company: args.company,
        location: args.location,
        apply_url: args.url,
    }
}

/// Print a notice and turn anything but success into a non-zero exit.
fn finish(notice: Notice, ok: bool) -> anyhow::Result<()> {
    println!("{}", cli::render_notice(&notice));
    if !ok {
        anyhow::bail!("{}", notice.body);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::new(&config.api_url, config.timeout())?);
    let links: Arc<dyn LinkOpener> = if config.no_open {
        Arc::new(PrintOpener)
    } else {
        Arc::new(SystemOpener)
    };
    tracing::info!("Using JobTracker API at {}", config.api_url);

    let coordinator = || {
        Coordinator::new(api.clone(), links.clone(), config.source.clone())
            .with_scope(config.action_scope())
    };

    match config.resolved_command() {
        Command::Browse { keyword, filters } => {
            let search = SearchScreen::new(
                api.clone(),
                links.clone(),
                &config.source,
                config.action_scope(),
            );
            search.feed().set_keyword(&keyword);
            search.feed().set_filters(filters.to_filters()?);
            let saved = SavedScreen::new(
                api.clone(),
                links.clone(),
                &config.source,
                config.action_scope(),
                JobStatus::Saved,
            );
            cli::browse(search, saved).await?;
        }
        Command::Search {
            keyword,
            page,
            filters,
        } => {
            let feed = SearchFeed::with_keyword(api.clone(), &keyword);
            feed.set_filters(filters.to_filters()?);
            let mut outcome = feed.trigger_search().await?;
            if page > 1
                && let Some(paged) = feed.set_page(page).await
            {
                outcome = paged;
            }
            let snapshot = feed.snapshot();
            let cards: Vec<JobCard> = snapshot.items.iter().cloned().map(JobCard::idle).collect();
            print!("{}", cli::render_search(&snapshot, &cards));
            if let FetchOutcome::Failed(e) = outcome {
                return Err(e.into());
            }
        }
        Command::Save(args) => {
            let outcome = coordinator().save(&external(args)).await;
            finish((&outcome).into(), !outcome.is_failure())?;
        }
        Command::Apply(args) => {
            let outcome = coordinator().apply_and_save(&external(args)).await;
            finish((&outcome).into(), !outcome.is_failure())?;
        }
        Command::Promote { id } => {
            let feed = TrackedFeed::new(api.clone(), JobStatus::Saved);
            if let FetchOutcome::Failed(e) = feed.load().await {
                return Err(e.into());
            }
            let Some(job) = feed.get(JobId(id)) else {
                anyhow::bail!("No saved job #{id}");
            };
            let outcome = coordinator().apply_tracked(&job).await;
            finish((&outcome).into(), !outcome.is_failure())?;
        }
        Command::List { status } => {
            let feed = TrackedFeed::new(api.clone(), status);
            let outcome = feed.load().await;
            print!("{}", cli::render_tracked(&feed.snapshot()));
            if let FetchOutcome::Failed(e) = outcome {
                return Err(e.into());
            }
        }
        Command::Delete { id } => {
            let outcome = coordinator().delete(JobId(id)).await;
            finish((&outcome).into(), !outcome.is_failure())?;
        }
    }

    Ok(())
}
