use std::time::Duration;

use clap::Parser;

use crate::actions::ActionScope;
use crate::feed::search::DEFAULT_KEYWORD;
use crate::models::{Experience, JobStatus, SearchFilters};

#[derive(Parser, Debug, Clone)]
#[command(name = "jobtracker", about = "Search jobs and track saved/applied ones")]
pub struct Config {
    /// Base URL of the JobTracker API
    #[arg(long, env = "JOBTRACKER_API_URL", default_value = "http://localhost:8080/api")]
    pub api_url: String,

    /// Provider tag stored with every saved or applied job
    #[arg(long, env = "JOBTRACKER_SOURCE", default_value = "JSEARCH")]
    pub source: String,

    /// Request timeout in seconds
    #[arg(long, env = "JOBTRACKER_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Print apply links instead of opening them
    #[arg(long)]
    pub no_open: bool,

    /// Allow only one job action in flight at a time across all jobs
    #[arg(long)]
    pub exclusive_actions: bool,

    /// Emit logs as JSON
    #[arg(long, env = "JOBTRACKER_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Location to search in
    #[arg(long)]
    pub location: Option<String>,

    /// new_grad, entry_level, one_plus or three_plus
    #[arg(long)]
    pub experience: Option<String>,

    /// Comma-separated skills
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,

    #[arg(long)]
    pub remote: bool,

    #[arg(long)]
    pub hybrid: bool,

    /// Prefer military-friendly employers
    #[arg(long)]
    pub military: bool,
}

impl FilterArgs {
    pub fn to_filters(&self) -> anyhow::Result<SearchFilters> {
        let experience = self
            .experience
            .as_deref()
            .map(str::parse::<Experience>)
            .transpose()?;
        Ok(SearchFilters {
            location: self.location.clone(),
            experience,
            skills: self.skills.clone(),
            remote: self.remote,
            hybrid: self.hybrid,
            military: self.military,
        })
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct JobArgs {
    /// Job title
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Apply link; also the job's identity
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive search and saved-jobs screens (default)
    Browse {
        /// Initial keyword
        #[arg(long, default_value = DEFAULT_KEYWORD)]
        keyword: String,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print one page of search results
    Search {
        keyword: String,

        #[arg(long, default_value = "1")]
        page: i64,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Save a job
    Save(JobArgs),
    /// Mark a job as applied and open its link
    Apply(JobArgs),
    /// Promote a saved job (by id) to applied
    Promote { id: i64 },
    /// List saved or applied jobs
    List {
        #[arg(default_value = "saved")]
        status: JobStatus,
    },
    /// Delete a tracked job by id
    Delete { id: i64 },
}

impl Config {
    /// Resolve the command, defaulting to Browse if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Browse {
            keyword: DEFAULT_KEYWORD.to_string(),
            filters: FilterArgs::default(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn action_scope(&self) -> ActionScope {
        if self.exclusive_actions {
            ActionScope::Exclusive
        } else {
            ActionScope::PerJob
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_browse() {
        let config = Config::parse_from(["jobtracker"]);
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.source, "JSEARCH");
        assert_eq!(config.action_scope(), ActionScope::PerJob);
        match config.resolved_command() {
            Command::Browse { keyword, .. } => assert_eq!(keyword, "software engineer"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_search_with_filters() {
        let config = Config::parse_from([
            "jobtracker",
            "--exclusive-actions",
            "search",
            "rust",
            "--page",
            "2",
            "--skills",
            "java,python",
            "--experience",
            "entry-level",
            "--remote",
        ]);
        assert_eq!(config.action_scope(), ActionScope::Exclusive);
        let Some(Command::Search { keyword, page, filters }) = config.command else {
            panic!("expected search");
        };
        assert_eq!(keyword, "rust");
        assert_eq!(page, 2);
        let filters = filters.to_filters().unwrap();
        assert_eq!(filters.skills, vec!["java".to_string(), "python".to_string()]);
        assert_eq!(filters.experience, Some(Experience::EntryLevel));
        assert!(filters.remote);
    }

    #[test]
    fn list_status_parses() {
        let config = Config::parse_from(["jobtracker", "list", "APPLIED"]);
        assert!(matches!(
            config.command,
            Some(Command::List {
                status: JobStatus::Applied
            })
        ));
    }
}
