// Per-screen view models. Each screen owns one feed controller and one
// action coordinator; the feed's list is what gets rendered.

use std::sync::Arc;

use crate::actions::{ActionOutcome, ActionScope, Coordinator, LinkOpener, LinkOutcome, Mutation};
use crate::api::JobApi;
use crate::error::AppError;
use crate::feed::{FetchOutcome, SearchFeed, TrackedFeed};
use crate::models::{ActionTarget, ExternalJob, JobId, JobKey, JobStatus, TrackedJob};

/// A message for the user, shown as an alert or status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    fn error(err: &AppError) -> Self {
        Notice::new("Error", err.user_message())
    }
}

impl From<&ActionOutcome> for Notice {
    fn from(outcome: &ActionOutcome) -> Self {
        let (title, body) = outcome.user_message();
        Notice::new(title, body)
    }
}

fn link_notice(outcome: &LinkOutcome) -> Option<Notice> {
    outcome
        .user_message()
        .map(|body| Notice::new("Can't open link", body))
}

fn page_notice(outcome: Option<FetchOutcome>) -> Option<Notice> {
    match outcome? {
        FetchOutcome::Failed(AppError::Validation(msg)) => Some(Notice::new("Enter a keyword", msg)),
        FetchOutcome::Failed(e) => Some(Notice::error(&e)),
        _ => None,
    }
}

/// One search result as rendered: its key and whether an action is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub key: JobKey,
    pub job: ExternalJob,
    pub busy: Option<Mutation>,
}

impl JobCard {
    /// A card with no action running.
    pub fn idle(job: ExternalJob) -> Self {
        Self {
            key: JobKey::of(&job),
            job,
            busy: None,
        }
    }

    pub fn actions_enabled(&self) -> bool {
        self.busy.is_none()
    }

    pub fn can_apply(&self) -> bool {
        self.job.apply_url.is_some()
    }
}

pub struct SearchScreen {
    feed: SearchFeed,
    actions: Coordinator,
}

impl SearchScreen {
    pub fn new(
        api: Arc<dyn JobApi>,
        links: Arc<dyn LinkOpener>,
        source: &str,
        scope: ActionScope,
    ) -> Self {
        Self {
            feed: SearchFeed::new(api.clone()),
            actions: Coordinator::new(api, links, source).with_scope(scope),
        }
    }

    pub fn feed(&self) -> &SearchFeed {
        &self.feed
    }

    pub fn actions(&self) -> &Coordinator {
        &self.actions
    }

    /// Run the search. Only a rejected keyword or a failed fetch produces a
    /// notice; results are read from the feed.
    pub async fn search(&self) -> Option<Notice> {
        match self.feed.trigger_search().await {
            Ok(FetchOutcome::Failed(e)) => Some(Notice::error(&e)),
            Ok(_) => None,
            Err(AppError::Validation(msg)) => Some(Notice::new("Enter a keyword", msg)),
            Err(e) => Some(Notice::error(&e)),
        }
    }

    pub async fn next_page(&self) -> Option<Notice> {
        page_notice(self.feed.next_page().await)
    }

    pub async fn prev_page(&self) -> Option<Notice> {
        page_notice(self.feed.prev_page().await)
    }

    pub fn cards(&self) -> Vec<JobCard> {
        self.feed
            .snapshot()
            .items
            .into_iter()
            .map(|job| {
                let key = JobKey::of(&job);
                let busy = self.actions.mutation_of(&ActionTarget::Weak(key.clone()));
                JobCard { key, job, busy }
            })
            .collect()
    }

    fn job_at(&self, index: usize) -> Result<ExternalJob, Notice> {
        self.feed
            .get(index)
            .ok_or_else(|| Notice::new("Error", format!("No job at position {}", index + 1)))
    }

    pub async fn save(&self, index: usize) -> Notice {
        match self.job_at(index) {
            Ok(job) => Notice::from(&self.actions.save(&job).await),
            Err(notice) => notice,
        }
    }

    pub async fn apply(&self, index: usize) -> Notice {
        match self.job_at(index) {
            Ok(job) => Notice::from(&self.actions.apply_and_save(&job).await),
            Err(notice) => notice,
        }
    }

    pub async fn open(&self, index: usize) -> Option<Notice> {
        let job = match self.job_at(index) {
            Ok(job) => job,
            Err(notice) => return Some(notice),
        };
        let Some(url) = job.apply_url else {
            return Some(Notice::new("Can't open link", "This job has no apply link."));
        };
        link_notice(&self.actions.open_link(&url).await)
    }
}

pub struct SavedScreen {
    feed: TrackedFeed,
    actions: Coordinator,
}

impl SavedScreen {
    pub fn new(
        api: Arc<dyn JobApi>,
        links: Arc<dyn LinkOpener>,
        source: &str,
        scope: ActionScope,
        filter: JobStatus,
    ) -> Self {
        Self {
            feed: TrackedFeed::new(api.clone(), filter),
            actions: Coordinator::new(api, links, source).with_scope(scope),
        }
    }

    pub fn feed(&self) -> &TrackedFeed {
        &self.feed
    }

    pub fn actions(&self) -> &Coordinator {
        &self.actions
    }

    /// Initial fetch when the screen is shown.
    pub async fn mount(&self) -> Option<Notice> {
        match self.feed.load().await {
            FetchOutcome::Failed(e) => Some(Notice::error(&e)),
            _ => None,
        }
    }

    pub async fn show(&self, filter: JobStatus) -> Option<Notice> {
        match self.feed.set_filter(filter).await {
            Some(FetchOutcome::Failed(e)) => Some(Notice::error(&e)),
            _ => None,
        }
    }

    fn job(&self, id: JobId) -> Result<TrackedJob, Notice> {
        self.feed
            .get(id)
            .ok_or_else(|| Notice::new("Error", format!("No job #{id} in this list")))
    }

    pub async fn delete(&self, id: JobId) -> Notice {
        if let Err(notice) = self.job(id) {
            return notice;
        }
        let outcome = self.actions.delete(id).await;
        self.feed.reconcile(&outcome);
        Notice::from(&outcome)
    }

    pub async fn apply(&self, id: JobId) -> Notice {
        let job = match self.job(id) {
            Ok(job) => job,
            Err(notice) => return notice,
        };
        let outcome = self.actions.apply_tracked(&job).await;
        self.feed.reconcile(&outcome);
        Notice::from(&outcome)
    }

    pub async fn open(&self, id: JobId) -> Option<Notice> {
        let job = match self.job(id) {
            Ok(job) => job,
            Err(notice) => return Some(notice),
        };
        let Some(url) = job.apply_url else {
            return Some(Notice::new("Can't open link", "This job has no apply link."));
        };
        link_notice(&self.actions.open_link(&url).await)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{FakeApi, RecordingOpener, external, tracked};

    fn search_screen(api: &Arc<FakeApi>, links: &Arc<RecordingOpener>) -> SearchScreen {
        SearchScreen::new(api.clone(), links.clone(), "JSEARCH", ActionScope::PerJob)
    }

    fn saved_screen(api: &Arc<FakeApi>) -> SavedScreen {
        SavedScreen::new(
            api.clone(),
            Arc::new(RecordingOpener::default()),
            "JSEARCH",
            ActionScope::PerJob,
            JobStatus::Saved,
        )
    }

    #[tokio::test]
    async fn blank_search_prompts_for_keyword() {
        let api = Arc::new(FakeApi::default());
        let screen = search_screen(&api, &Arc::new(RecordingOpener::default()));
        screen.feed().set_keyword("");

        assert_eq!(
            screen.search().await,
            Some(Notice::new("Enter a keyword", "Type something to search."))
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn paging_with_blank_keyword_prompts_without_request() {
        let api = Arc::new(FakeApi::default());
        let screen = search_screen(&api, &Arc::new(RecordingOpener::default()));
        assert_eq!(screen.search().await, None);

        screen.feed().set_keyword(" ");
        assert_eq!(
            screen.next_page().await,
            Some(Notice::new("Enter a keyword", "Type something to search."))
        );
        assert_eq!(api.calls_to("search"), 1);
    }

    #[tokio::test]
    async fn save_then_save_again() {
        let api = Arc::new(
            FakeApi::default().with_page(1, vec![external("Engineer", Some("https://x/1"))]),
        );
        let screen = search_screen(&api, &Arc::new(RecordingOpener::default()));
        assert_eq!(screen.search().await, None);

        assert_eq!(screen.save(0).await, Notice::new("Saved", "Job saved."));
        assert!(screen.cards()[0].actions_enabled());
        assert_eq!(
            screen.save(0).await,
            Notice::new("Already saved", "You saved this job earlier.")
        );
        assert_eq!(api.tracked(JobStatus::Saved).len(), 1);
    }

    #[tokio::test]
    async fn card_shows_busy_while_saving() {
        let api = Arc::new(FakeApi::default().with_page(
            1,
            vec![
                external("Engineer", Some("https://x/1")),
                external("Designer", Some("https://x/2")),
            ],
        ));
        let screen = search_screen(&api, &Arc::new(RecordingOpener::default()));
        screen.search().await;
        let release = api.hold("save:https://x/1");

        let (notice, ()) = tokio::join!(screen.save(0), async {
            api.wait_for_calls(2).await;
            let cards = screen.cards();
            assert_eq!(cards[0].busy, Some(Mutation::Saving));
            assert!(!cards[0].actions_enabled());
            assert!(cards[1].actions_enabled());
            release.notify_one();
        });
        assert_eq!(notice.title, "Saved");
    }

    #[tokio::test]
    async fn apply_opens_link_and_out_of_range_is_reported() {
        let api = Arc::new(
            FakeApi::default().with_page(1, vec![external("Engineer", Some("https://x/1"))]),
        );
        let links = Arc::new(RecordingOpener::default());
        let screen = search_screen(&api, &links);
        screen.search().await;

        assert_eq!(screen.apply(0).await.title, "Applied");
        assert_eq!(links.opened(), vec!["https://x/1".to_string()]);
        assert_eq!(
            screen.apply(5).await,
            Notice::new("Error", "No job at position 6")
        );
    }

    #[tokio::test]
    async fn open_without_url_is_reported() {
        let api = Arc::new(FakeApi::default().with_page(1, vec![external("Engineer", None)]));
        let links = Arc::new(RecordingOpener::default());
        let screen = search_screen(&api, &links);
        screen.search().await;

        assert_eq!(screen.open(0).await.map(|n| n.title), Some("Can't open link".into()));
        assert!(!screen.cards()[0].can_apply());
    }

    #[tokio::test]
    async fn delete_success_then_failure() {
        let api = Arc::new(
            FakeApi::default()
                .with_row(tracked(7, JobStatus::Saved))
                .with_row(tracked(8, JobStatus::Saved)),
        );
        let screen = saved_screen(&api);
        assert_eq!(screen.mount().await, None);

        assert_eq!(screen.delete(JobId(7)).await.title, "Deleted");
        assert_eq!(screen.feed().get(JobId(7)), None);

        api.fail_next(
            "delete",
            AppError::Transport {
                status: 500,
                body: "Internal Server Error".into(),
            },
        );
        let notice = screen.delete(JobId(8)).await;
        assert_eq!(notice, Notice::new("Error", "HTTP 500 Internal Server Error"));
        assert!(screen.feed().get(JobId(8)).is_some());
    }

    #[tokio::test]
    async fn apply_from_saved_moves_record() {
        let api = Arc::new(FakeApi::default().with_row(tracked(3, JobStatus::Saved)));
        let screen = saved_screen(&api);
        screen.mount().await;

        assert_eq!(screen.apply(JobId(3)).await.title, "Applied");
        assert!(screen.feed().snapshot().items.is_empty());

        screen.show(JobStatus::Applied).await;
        assert_eq!(screen.feed().snapshot().items[0].id, JobId(3));
    }

    #[tokio::test]
    async fn unknown_id_is_not_sent() {
        let api = Arc::new(FakeApi::default());
        let screen = saved_screen(&api);
        screen.mount().await;

        assert_eq!(screen.delete(JobId(42)).await.body, "No job #42 in this list");
        assert_eq!(api.calls_to("delete"), 0);
    }
}
