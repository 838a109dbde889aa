use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::job::{ExternalJob, TrackedJob};

/// Weak identity for a search result that has no server id yet.
///
/// Derived from `applyUrl`, falling back to `title`, then to the empty
/// string. Two jobs with the same non-empty apply URL are the same job; the
/// title fallback is best effort and may collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey(String);

impl JobKey {
    /// The single derivation used for both action tracking and render keys.
    pub fn of(job: &ExternalJob) -> Self {
        let key = job
            .apply_url
            .as_deref()
            .or(job.title.as_deref())
            .unwrap_or_default();
        JobKey(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<unkeyed>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Server-assigned id of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an in-flight mutation is keyed on: a weak key for search results,
/// the strong id for tracked records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionTarget {
    Weak(JobKey),
    Tracked(JobId),
}

impl From<&ExternalJob> for ActionTarget {
    fn from(job: &ExternalJob) -> Self {
        ActionTarget::Weak(JobKey::of(job))
    }
}

impl From<&TrackedJob> for ActionTarget {
    fn from(job: &TrackedJob) -> Self {
        ActionTarget::Tracked(job.id)
    }
}

impl From<JobId> for ActionTarget {
    fn from(id: JobId) -> Self {
        ActionTarget::Tracked(id)
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTarget::Weak(key) => write!(f, "job {key}"),
            ActionTarget::Tracked(id) => write!(f, "job #{id}"),
        }
    }
}
