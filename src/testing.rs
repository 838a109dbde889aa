// In-memory stand-ins for the service and link ports, used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::actions::LinkOpener;
use crate::api::JobApi;
use crate::error::AppError;
use crate::models::{
    ApplyRequest, ExternalJob, JobId, JobPayload, JobStatus, SearchQuery, TrackedJob,
};

/// Behaves like the tracker service: save/apply conflict on a repeated
/// apply URL, apply promotes a saved row, list filters by status.
///
/// `hold(key)` parks the next call matching `key` until released; keys are
/// `search:<page>`, `list:<status>`, `save:<url>`, `apply:<url>`,
/// `delete:<id>`.
#[derive(Default)]
pub struct FakeApi {
    rows: Mutex<Vec<TrackedJob>>,
    next_id: Mutex<i64>,
    pages: Mutex<HashMap<u32, Vec<ExternalJob>>>,
    failures: Mutex<HashMap<&'static str, VecDeque<AppError>>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl FakeApi {
    pub fn with_page(self, page: u32, jobs: Vec<ExternalJob>) -> Self {
        self.pages.lock().unwrap().insert(page, jobs);
        self
    }

    pub fn with_row(self, row: TrackedJob) -> Self {
        {
            let mut next = self.next_id.lock().unwrap();
            *next = (*next).max(row.id.0);
        }
        self.rows.lock().unwrap().push(row);
        self
    }

    pub fn fail_next(&self, op: &'static str, err: AppError) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(err);
    }

    pub fn hold(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(key.to_string(), notify.clone());
        notify
    }

    pub fn tracked(&self, status: JobStatus) -> Vec<TrackedJob> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(o, _)| *o == op).count()
    }

    /// Yield until at least `n` calls have reached the fake.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let seen = self.calls.lock().unwrap().len();
            if seen >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    async fn enter(&self, op: &'static str, detail: String) -> Result<(), AppError> {
        self.calls.lock().unwrap().push((op, detail.clone()));
        let hold = self.holds.lock().unwrap().remove(&format!("{op}:{detail}"));
        if let Some(notify) = hold {
            notify.notified().await;
        }
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn insert(&self, payload: &JobPayload, status: JobStatus) {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        self.rows.lock().unwrap().push(TrackedJob {
            id: JobId(*next),
            title: payload.position.clone(),
            company: payload.company.clone(),
            location: payload.location.clone(),
            apply_url: payload.apply_url.clone(),
            status,
            notes: payload.notes.clone(),
            source: payload.source.clone(),
            applied_date: None,
        });
    }

    fn exists(&self, url: Option<&str>, status: JobStatus) -> bool {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            return false;
        };
        self.rows.lock().unwrap().iter().any(|r| {
            r.status == status
                && r.apply_url
                    .as_deref()
                    .is_some_and(|u| u.eq_ignore_ascii_case(url))
        })
    }
}

#[async_trait]
impl JobApi for FakeApi {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ExternalJob>, AppError> {
        self.enter("search", query.page.to_string()).await?;
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&query.page)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, payload: &JobPayload) -> Result<(), AppError> {
        let url = payload.apply_url.clone().unwrap_or_default();
        self.enter("save", url).await?;
        if self.exists(payload.apply_url.as_deref(), JobStatus::Saved) {
            return Err(AppError::Conflict("Already saved".into()));
        }
        self.insert(payload, JobStatus::Saved);
        Ok(())
    }

    async fn apply(&self, request: &ApplyRequest) -> Result<(), AppError> {
        let (url, id) = match request {
            ApplyRequest::New(p) => (p.apply_url.clone(), None),
            ApplyRequest::Promote(p) => (p.apply_url.clone(), Some(p.id)),
        };
        self.enter("apply", url.clone().unwrap_or_default()).await?;
        if self.exists(url.as_deref(), JobStatus::Applied) {
            return Err(AppError::Conflict("Already applied".into()));
        }

        {
            let mut rows = self.rows.lock().unwrap();
            let existing = rows.iter_mut().find(|r| {
                Some(r.id) == id || (url.is_some() && r.apply_url == url)
            });
            if let Some(row) = existing {
                row.status = JobStatus::Applied;
                return Ok(());
            }
        }

        match request {
            ApplyRequest::New(p) => self.insert(p, JobStatus::Applied),
            ApplyRequest::Promote(p) => {
                return Err(AppError::Transport {
                    status: 404,
                    body: format!("Job {} not found", p.id),
                });
            }
        }
        Ok(())
    }

    async fn list(&self, status: JobStatus) -> Result<Vec<TrackedJob>, AppError> {
        self.enter("list", status.to_string()).await?;
        Ok(self.tracked(status))
    }

    async fn delete(&self, id: JobId) -> Result<(), AppError> {
        self.enter("delete", id.to_string()).await?;
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

/// Records opened URLs instead of launching anything.
#[derive(Default)]
pub struct RecordingOpener {
    refuse: bool,
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            opened: Mutex::default(),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn can_open(&self, _url: &str) -> bool {
        !self.refuse
    }

    async fn open(&self, url: &str) -> Result<(), AppError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn external(title: &str, url: Option<&str>) -> ExternalJob {
    ExternalJob {
        title: Some(title.to_string()),
        company: Some("Acme".to_string()),
        location: Some("Remote".to_string()),
        apply_url: url.map(String::from),
    }
}

pub fn tracked(id: i64, status: JobStatus) -> TrackedJob {
    TrackedJob {
        id: JobId(id),
        title: Some(format!("Job {id}")),
        company: Some("Acme".to_string()),
        location: None,
        apply_url: Some(format!("https://x/{id}")),
        status,
        notes: None,
        source: Some("JSEARCH".to_string()),
        applied_date: None,
    }
}
