// Result feed controllers: paginated search and the saved/applied review list.
//
// Both share `FeedState`, which numbers every issued fetch and only accepts
// the response of the most recent one. Responses are never aborted; stale
// ones are dropped when they arrive.

pub mod search;
pub mod tracked;

use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;

pub use search::{SearchFeed, SearchSnapshot};
pub use tracked::{TrackedFeed, TrackedSnapshot};

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sequence number handed out when a fetch is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
}

/// What happened to one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied; holds the number of records shown.
    Loaded(usize),
    /// The fetch failed; the list was cleared and the error recorded.
    Failed(AppError),
    /// A newer fetch was issued before this one settled, so its response
    /// was discarded.
    Superseded,
}

/// List state owned by one controller.
#[derive(Debug, Clone)]
pub struct FeedState<T> {
    items: Vec<T>,
    error: Option<String>,
    phase: Phase,
    issued: u64,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            phase: Phase::Idle,
            issued: 0,
        }
    }
}

impl<T: Clone> FeedState<T> {
    /// Issue a new fetch. Any earlier fetch still pending becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.phase = Phase::Fetching;
        self.error = None;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Settle a fetch. Only the latest ticket touches the list and the busy
    /// flag; the busy flag clears whether the fetch succeeded or failed.
    pub fn finish(&mut self, ticket: Ticket, result: Result<Vec<T>, AppError>) -> FetchOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                seq = ticket.0,
                latest = self.issued,
                "Discarding stale fetch response"
            );
            return FetchOutcome::Superseded;
        }

        self.phase = Phase::Idle;
        match result {
            Ok(items) => {
                let n = items.len();
                self.items = items;
                self.error = None;
                FetchOutcome::Loaded(n)
            }
            Err(e) => {
                tracing::warn!(seq = ticket.0, "Fetch failed: {e}");
                self.items.clear();
                self.error = Some(e.user_message());
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Drop records matching `pred` without refetching. Returns how many
    /// were removed.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !pred(item));
        before - self.items.len()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Fetching
    }
}
