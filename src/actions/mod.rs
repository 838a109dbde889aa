// Action coordinator: one remote mutation per job at a time.

pub mod link;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::JobApi;
use crate::error::AppError;
use crate::models::{
    ActionTarget, ApplyRequest, ExternalJob, JobId, JobPayload, PromoteRequest, TrackedJob,
};

pub use link::{LinkOpener, LinkOutcome, PrintOpener, SystemOpener, open_checked};

/// How far the in-flight restriction reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionScope {
    /// Serialize per target; different jobs may be mutated concurrently.
    #[default]
    PerJob,
    /// A single slot for the whole screen: at most one target in flight.
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Saving,
    Applying,
    Deleting,
}

impl Mutation {
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Saving => "Saving...",
            Mutation::Applying => "Applying...",
            Mutation::Deleting => "Deleting...",
        }
    }
}

/// Result of a single user-triggered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Saved,
    AlreadySaved,
    /// The server acknowledged the apply. `link` is set when an apply URL
    /// was present and an open was attempted.
    Applied {
        id: Option<JobId>,
        link: Option<LinkOutcome>,
    },
    AlreadyApplied,
    Deleted(JobId),
    Failed(AppError),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Saved | ActionOutcome::Applied { .. } | ActionOutcome::Deleted(_)
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ActionOutcome::Failed(_))
    }

    /// The tracked record a list should drop after this outcome, if any.
    /// Only confirmed successes remove anything.
    pub fn removed_id(&self) -> Option<JobId> {
        match self {
            ActionOutcome::Deleted(id) => Some(*id),
            ActionOutcome::Applied { id, .. } => *id,
            _ => None,
        }
    }

    /// Title and body of the message shown to the user.
    pub fn user_message(&self) -> (&'static str, String) {
        match self {
            ActionOutcome::Saved => ("Saved", "Job saved.".to_string()),
            ActionOutcome::AlreadySaved => {
                ("Already saved", "You saved this job earlier.".to_string())
            }
            ActionOutcome::Applied { link, .. } => {
                let body = link
                    .as_ref()
                    .and_then(LinkOutcome::user_message)
                    .unwrap_or_else(|| "Marked as applied.".to_string());
                ("Applied", body)
            }
            ActionOutcome::AlreadyApplied => (
                "Already applied",
                "You already applied to this job.".to_string(),
            ),
            ActionOutcome::Deleted(_) => ("Deleted", "Job removed.".to_string()),
            ActionOutcome::Failed(e) => ("Error", e.user_message()),
        }
    }
}

type InFlightMap = Arc<Mutex<HashMap<ActionTarget, Mutation>>>;

fn lock(map: &InFlightMap) -> MutexGuard<'_, HashMap<ActionTarget, Mutation>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds a target's in-flight marker; dropping it clears the marker on every
/// exit path, including cancellation of the owning future.
struct InFlightGuard {
    map: InFlightMap,
    target: ActionTarget,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.map).remove(&self.target);
    }
}

/// Performs save/apply/delete for one job at a time and translates the
/// transport result into an [`ActionOutcome`]. Nothing is retried.
#[derive(Clone)]
pub struct Coordinator {
    api: Arc<dyn JobApi>,
    links: Arc<dyn LinkOpener>,
    source: String,
    scope: ActionScope,
    in_flight: InFlightMap,
}

impl Coordinator {
    pub fn new(api: Arc<dyn JobApi>, links: Arc<dyn LinkOpener>, source: impl Into<String>) -> Self {
        Self {
            api,
            links,
            source: source.into(),
            scope: ActionScope::default(),
            in_flight: Arc::default(),
        }
    }

    pub fn with_scope(mut self, scope: ActionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether action controls for `target` must be disabled.
    pub fn is_busy(&self, target: &ActionTarget) -> bool {
        lock(&self.in_flight).contains_key(target)
    }

    pub fn mutation_of(&self, target: &ActionTarget) -> Option<Mutation> {
        lock(&self.in_flight).get(target).copied()
    }

    pub fn in_flight(&self) -> Vec<ActionTarget> {
        lock(&self.in_flight).keys().cloned().collect()
    }

    fn begin(&self, target: ActionTarget, mutation: Mutation) -> Result<InFlightGuard, AppError> {
        let mut map = lock(&self.in_flight);
        if map.contains_key(&target) {
            return Err(AppError::InFlight(target.to_string()));
        }
        if self.scope == ActionScope::Exclusive
            && let Some(other) = map.keys().next()
        {
            return Err(AppError::InFlight(other.to_string()));
        }
        map.insert(target.clone(), mutation);
        drop(map);

        Ok(InFlightGuard {
            map: self.in_flight.clone(),
            target,
        })
    }

    /// Save a search result. A 409 means the job was saved earlier and is
    /// reported as `AlreadySaved`, not as a failure.
    pub async fn save(&self, job: &ExternalJob) -> ActionOutcome {
        let target = ActionTarget::from(job);
        let _guard = match self.begin(target.clone(), Mutation::Saving) {
            Ok(g) => g,
            Err(e) => return ActionOutcome::Failed(e),
        };

        let payload = JobPayload::from_external(job, &self.source);
        let outcome = match self.api.save(&payload).await {
            Ok(()) => ActionOutcome::Saved,
            Err(AppError::Conflict(_)) => ActionOutcome::AlreadySaved,
            Err(e) => ActionOutcome::Failed(e),
        };
        log_outcome("save", &target, &outcome);
        outcome
    }

    /// Record an apply for a search result, then open its apply link once
    /// the server has acknowledged the transition.
    pub async fn apply_and_save(&self, job: &ExternalJob) -> ActionOutcome {
        let request = ApplyRequest::New(JobPayload::from_external(job, &self.source));
        self.apply(ActionTarget::from(job), request, None, job.apply_url.as_deref())
            .await
    }

    /// Promote a tracked record to APPLIED.
    pub async fn apply_tracked(&self, job: &TrackedJob) -> ActionOutcome {
        let request = ApplyRequest::Promote(PromoteRequest::from_tracked(job));
        self.apply(
            ActionTarget::from(job),
            request,
            Some(job.id),
            job.apply_url.as_deref(),
        )
        .await
    }

    async fn apply(
        &self,
        target: ActionTarget,
        request: ApplyRequest,
        id: Option<JobId>,
        apply_url: Option<&str>,
    ) -> ActionOutcome {
        let guard = match self.begin(target.clone(), Mutation::Applying) {
            Ok(g) => g,
            Err(e) => return ActionOutcome::Failed(e),
        };

        let result = self.api.apply(&request).await;
        drop(guard);

        let outcome = match result {
            Ok(()) => {
                let link = match apply_url.filter(|u| !u.trim().is_empty()) {
                    Some(url) => Some(open_checked(self.links.as_ref(), url).await),
                    None => None,
                };
                ActionOutcome::Applied { id, link }
            }
            Err(AppError::Conflict(_)) => ActionOutcome::AlreadyApplied,
            Err(e) => ActionOutcome::Failed(e),
        };
        log_outcome("apply", &target, &outcome);
        outcome
    }

    /// Delete a tracked record. The caller removes it locally only on
    /// `Deleted`.
    pub async fn delete(&self, id: JobId) -> ActionOutcome {
        let target = ActionTarget::from(id);
        let _guard = match self.begin(target.clone(), Mutation::Deleting) {
            Ok(g) => g,
            Err(e) => return ActionOutcome::Failed(e),
        };

        let outcome = match self.api.delete(id).await {
            Ok(()) => ActionOutcome::Deleted(id),
            Err(e) => ActionOutcome::Failed(e),
        };
        log_outcome("delete", &target, &outcome);
        outcome
    }

    pub async fn open_link(&self, url: &str) -> LinkOutcome {
        open_checked(self.links.as_ref(), url).await
    }
}

fn log_outcome(action: &str, target: &ActionTarget, outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Failed(e) => tracing::warn!("{action} for {target} failed: {e}"),
        other => tracing::info!("{action} for {target}: {other:?}"),
    }
}
