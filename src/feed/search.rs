use std::sync::{Arc, Mutex};

use crate::api::JobApi;
use crate::error::AppError;
use crate::feed::{FeedState, FetchOutcome, lock};
use crate::models::{ExternalJob, JobKey, SearchFilters, SearchQuery};

pub const DEFAULT_KEYWORD: &str = "software engineer";

#[derive(Debug, Clone)]
struct SearchState {
    keyword: String,
    page: u32,
    filters: SearchFilters,
    has_searched: bool,
    /// Keyword or filters changed since the shown results were requested.
    stale: bool,
    feed: FeedState<ExternalJob>,
}

/// Point-in-time view of the search controller for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub keyword: String,
    pub page: u32,
    pub has_searched: bool,
    /// The items belong to a keyword or filters that have since been edited.
    pub stale: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub items: Vec<ExternalJob>,
}

impl SearchSnapshot {
    pub fn page_label(&self) -> String {
        format!("Page {}", self.page)
    }

    pub fn can_prev(&self) -> bool {
        !self.busy && self.page > 1
    }

    pub fn can_next(&self) -> bool {
        !self.busy
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        (self.has_searched
            && !self.stale
            && !self.busy
            && self.error.is_none()
            && self.items.is_empty())
            .then_some("No results on this page.")
    }

    /// Render keys, derived exactly as the action coordinator derives them.
    pub fn keys(&self) -> Vec<JobKey> {
        self.items.iter().map(JobKey::of).collect()
    }
}

/// Paginated search keyed by `(keyword, page)`.
///
/// Page changes only fetch once the first explicit search has happened.
pub struct SearchFeed {
    api: Arc<dyn JobApi>,
    state: Mutex<SearchState>,
}

impl SearchFeed {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self::with_keyword(api, DEFAULT_KEYWORD)
    }

    pub fn with_keyword(api: Arc<dyn JobApi>, keyword: &str) -> Self {
        Self {
            api,
            state: Mutex::new(SearchState {
                keyword: keyword.to_string(),
                page: 1,
                filters: SearchFilters::default(),
                has_searched: false,
                stale: false,
                feed: FeedState::default(),
            }),
        }
    }

    /// Leading whitespace is dropped and the page resets to 1. Does not fetch;
    /// results already shown are marked stale until the next fetch.
    pub fn set_keyword(&self, text: &str) {
        let mut state = lock(&self.state);
        let keyword = text.trim_start();
        if keyword != state.keyword {
            state.stale = state.has_searched;
        }
        state.keyword = keyword.to_string();
        state.page = 1;
    }

    /// Same rules as a keyword edit.
    pub fn set_filters(&self, filters: SearchFilters) {
        let mut state = lock(&self.state);
        if filters != state.filters {
            state.stale = state.has_searched;
        }
        state.filters = filters;
        state.page = 1;
    }

    /// Start a search from page 1. A blank keyword is rejected before any
    /// request is made.
    pub async fn trigger_search(&self) -> Result<FetchOutcome, AppError> {
        {
            let mut state = lock(&self.state);
            if state.keyword.trim().is_empty() {
                return Err(blank_keyword());
            }
            state.has_searched = true;
            state.page = 1;
        }
        Ok(self.fetch().await)
    }

    /// Move to page `n` (clamped to at least 1). Returns `None` when nothing
    /// was fetched: before the first search, or when the page did not change.
    pub async fn set_page(&self, n: i64) -> Option<FetchOutcome> {
        let page = n.clamp(1, i64::from(u32::MAX)) as u32;
        {
            let mut state = lock(&self.state);
            if state.page == page {
                return None;
            }
            state.page = page;
            if !state.has_searched {
                return None;
            }
        }
        Some(self.fetch().await)
    }

    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let page = lock(&self.state).page;
        self.set_page(i64::from(page) + 1).await
    }

    pub async fn prev_page(&self) -> Option<FetchOutcome> {
        let page = lock(&self.state).page;
        self.set_page(i64::from(page) - 1).await
    }

    /// Re-issue the current query, if a search has happened.
    pub async fn refresh(&self) -> Option<FetchOutcome> {
        if !lock(&self.state).has_searched {
            return None;
        }
        Some(self.fetch().await)
    }

    /// Every request goes through here, so a blank keyword never reaches the
    /// network even via paging or refresh.
    async fn fetch(&self) -> FetchOutcome {
        let (ticket, query) = {
            let mut state = lock(&self.state);
            if state.keyword.trim().is_empty() {
                return FetchOutcome::Failed(blank_keyword());
            }
            state.stale = false;
            let ticket = state.feed.begin();
            let query = SearchQuery {
                keyword: state.keyword.trim().to_string(),
                page: state.page,
                filters: state.filters.clone(),
            };
            (ticket, query)
        };

        tracing::debug!(seq = ticket.seq(), keyword = %query.keyword, page = query.page, "Searching");
        let result = self.api.search(&query).await;

        let outcome = lock(&self.state).feed.finish(ticket, result);
        if let FetchOutcome::Loaded(n) = outcome {
            tracing::info!("Search '{}' page {}: {n} results", query.keyword, query.page);
        }
        outcome
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = lock(&self.state);
        SearchSnapshot {
            keyword: state.keyword.clone(),
            page: state.page,
            has_searched: state.has_searched,
            stale: state.stale,
            busy: state.feed.is_busy(),
            error: state.feed.error().map(String::from),
            items: state.feed.items().to_vec(),
        }
    }

    /// The record at `index` in the current list.
    pub fn get(&self, index: usize) -> Option<ExternalJob> {
        lock(&self.state).feed.items().get(index).cloned()
    }
}

fn blank_keyword() -> AppError {
    AppError::Validation("Type something to search.".to_string())
}
