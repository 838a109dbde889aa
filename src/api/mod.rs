// Port for the remote job-search and persistence service.

pub mod http;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{ApplyRequest, ExternalJob, JobId, JobPayload, JobStatus, SearchQuery, TrackedJob};

pub use http::HttpJobApi;

/// The five REST operations the client consumes. Implementations classify
/// responses: 2xx is `Ok`, 409 is `AppError::Conflict`, any other status is
/// `AppError::Transport`, and a request that never completes is
/// `AppError::Network`.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// `GET /jobs/external/search`
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ExternalJob>, AppError>;

    /// `POST /jobs/save`
    async fn save(&self, payload: &JobPayload) -> Result<(), AppError>;

    /// `POST /jobs/apply`, either creating an APPLIED record or promoting a
    /// SAVED one.
    async fn apply(&self, request: &ApplyRequest) -> Result<(), AppError>;

    /// `GET /jobs/{status}`
    async fn list(&self, status: JobStatus) -> Result<Vec<TrackedJob>, AppError>;

    /// `DELETE /jobs/{id}`
    async fn delete(&self, id: JobId) -> Result<(), AppError>;
}
