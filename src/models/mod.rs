pub mod identity;
pub mod job;

pub use identity::{ActionTarget, JobId, JobKey};
pub use job::{
    ApplyRequest, Experience, ExternalJob, JobPayload, JobStatus, PromoteRequest, SearchFilters,
    SearchQuery, TrackedJob,
};
