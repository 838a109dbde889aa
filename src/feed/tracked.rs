use std::sync::{Arc, Mutex};

use crate::actions::ActionOutcome;
use crate::api::JobApi;
use crate::feed::{FeedState, FetchOutcome, lock};
use crate::models::{JobId, JobStatus, TrackedJob};

#[derive(Debug, Clone)]
struct TrackedState {
    filter: JobStatus,
    feed: FeedState<TrackedJob>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSnapshot {
    pub filter: JobStatus,
    pub busy: bool,
    pub error: Option<String>,
    pub items: Vec<TrackedJob>,
}

impl TrackedSnapshot {
    pub fn title(&self) -> String {
        format!("Your {} Jobs", self.filter.label())
    }

    pub fn empty_message(&self) -> Option<String> {
        (!self.busy && self.error.is_none() && self.items.is_empty())
            .then(|| format!("No {} jobs found.", self.filter.as_path()))
    }
}

/// Saved/applied review list keyed by its status filter.
pub struct TrackedFeed {
    api: Arc<dyn JobApi>,
    state: Mutex<TrackedState>,
}

impl TrackedFeed {
    pub fn new(api: Arc<dyn JobApi>, filter: JobStatus) -> Self {
        Self {
            api,
            state: Mutex::new(TrackedState {
                filter,
                feed: FeedState::default(),
            }),
        }
    }

    pub fn filter(&self) -> JobStatus {
        lock(&self.state).filter
    }

    /// Fetch the list for the current filter.
    pub async fn load(&self) -> FetchOutcome {
        let (ticket, filter) = {
            let mut state = lock(&self.state);
            (state.feed.begin(), state.filter)
        };

        tracing::debug!(seq = ticket.seq(), %filter, "Loading tracked jobs");
        let result = self.api.list(filter).await;
        lock(&self.state).feed.finish(ticket, result)
    }

    /// Switch between saved and applied. Refetches only when the filter
    /// actually changes.
    pub async fn set_filter(&self, filter: JobStatus) -> Option<FetchOutcome> {
        {
            let mut state = lock(&self.state);
            if state.filter == filter {
                return None;
            }
            state.filter = filter;
        }
        Some(self.load().await)
    }

    /// Drop a record locally after the server confirmed its removal.
    pub fn remove(&self, id: JobId) -> bool {
        lock(&self.state).feed.remove_where(|job| job.id == id) > 0
    }

    /// Apply the local effect of a confirmed action: deletes leave every
    /// view, applies leave the saved view. Anything else changes nothing.
    pub fn reconcile(&self, outcome: &ActionOutcome) -> bool {
        let id = match outcome {
            ActionOutcome::Deleted(id) => *id,
            ActionOutcome::Applied { id: Some(id), .. } if self.filter() == JobStatus::Saved => *id,
            _ => return false,
        };
        self.remove(id)
    }

    pub fn get(&self, id: JobId) -> Option<TrackedJob> {
        lock(&self.state)
            .feed
            .items()
            .iter()
            .find(|job| job.id == id)
            .cloned()
    }

    pub fn snapshot(&self) -> TrackedSnapshot {
        let state = lock(&self.state);
        TrackedSnapshot {
            filter: state.filter,
            busy: state.feed.is_busy(),
            error: state.feed.error().map(String::from),
            items: state.feed.items().to_vec(),
        }
    }
}
