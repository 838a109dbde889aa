use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::identity::JobId;

/// A job as returned by the external search provider. It has no server
/// identity and any field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJob {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
}

/// A job persisted by the tracker service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedJob {
    pub id: JobId,
    #[serde(default, alias = "position")]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub applied_date: Option<NaiveDate>,
}

impl TrackedJob {
    /// The search-shaped view of this record, used for rendering.
    pub fn as_external(&self) -> ExternalJob {
        ExternalJob {
            title: self.title.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            apply_url: self.apply_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Saved,
    Applied,
}

impl JobStatus {
    /// Path segment used by `GET /jobs/{status}`.
    pub fn as_path(&self) -> &'static str {
        match self {
            JobStatus::Saved => "saved",
            JobStatus::Applied => "applied",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Saved => "Saved",
            JobStatus::Applied => "Applied",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "saved" => Ok(JobStatus::Saved),
            "applied" => Ok(JobStatus::Applied),
            other => Err(AppError::Validation(format!("Unknown job status '{other}'"))),
        }
    }
}

// The service stores status as free text ("SAVED", "Applied", ...), so
// matching is case-insensitive in both directions.
impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_path().to_ascii_uppercase())
    }
}

/// Body of `POST /jobs/save` and `POST /jobs/apply` for a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub position: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
}

impl JobPayload {
    pub fn from_external(job: &ExternalJob, source: &str) -> Self {
        Self {
            position: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            apply_url: job.apply_url.clone(),
            notes: None,
            source: Some(source.to_string()),
        }
    }
}

/// Body of `POST /jobs/apply` when promoting an already tracked record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub id: JobId,
    pub position: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    pub status: String,
}

impl PromoteRequest {
    pub fn from_tracked(job: &TrackedJob) -> Self {
        Self {
            id: job.id,
            position: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            apply_url: job.apply_url.clone(),
            status: "Applied".to_string(),
        }
    }
}

/// Body sent to `POST /jobs/apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApplyRequest {
    New(JobPayload),
    Promote(PromoteRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experience {
    NewGrad,
    EntryLevel,
    OnePlus,
    ThreePlus,
}

impl Experience {
    pub fn as_param(&self) -> &'static str {
        match self {
            Experience::NewGrad => "new_grad",
            Experience::EntryLevel => "entry_level",
            Experience::OnePlus => "one_plus",
            Experience::ThreePlus => "three_plus",
        }
    }
}

impl FromStr for Experience {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "new_grad" => Ok(Experience::NewGrad),
            "entry_level" => Ok(Experience::EntryLevel),
            "one_plus" => Ok(Experience::OnePlus),
            "three_plus" => Ok(Experience::ThreePlus),
            _ => Err(AppError::Validation(format!("Unknown experience level '{s}'"))),
        }
    }
}

/// Optional refinements. Only the v2 search endpoint reads them, so a query
/// carrying any of these is sent there (see [`SearchQuery::path`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilters {
    pub location: Option<String>,
    pub experience: Option<Experience>,
    pub skills: Vec<String>,
    pub remote: bool,
    pub hybrid: bool,
    pub military: bool,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.location.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.experience.is_none()
            && self.skills.iter().all(|s| s.trim().is_empty())
            && !self.remote
            && !self.hybrid
            && !self.military
    }
}

/// One page request against the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub page: u32,
    pub filters: SearchFilters,
}

impl SearchQuery {
    /// Path relative to the API base. Filtered queries need the v2 endpoint;
    /// the plain one ignores everything but the keyword.
    pub fn path(&self) -> &'static str {
        if self.filters.is_empty() {
            "/jobs/external/search"
        } else {
            "/jobs/external/search2"
        }
    }

    /// Query-string pairs, omitting unset filters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("keyword", self.keyword.trim().to_string()),
            ("page", self.page.max(1).to_string()),
            ("numPages", "1".to_string()),
        ];

        let f = &self.filters;
        if let Some(location) = f.location.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("location", location.to_string()));
        }
        if let Some(exp) = f.experience {
            params.push(("experience", exp.as_param().to_string()));
        }
        let skills: Vec<&str> = f
            .skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !skills.is_empty() {
            params.push(("skills", skills.join(",")));
        }
        for (name, on) in [
            ("remote", f.remote),
            ("hybrid", f.hybrid),
            ("military", f.military),
        ] {
            if on {
                params.push((name, "true".to_string()));
            }
        }
        params
    }
}
