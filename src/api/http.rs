use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::api::JobApi;
use crate::error::AppError;
use crate::models::{ApplyRequest, ExternalJob, JobId, JobPayload, JobStatus, SearchQuery, TrackedJob};

const USER_AGENT: &str = concat!("jobtracker-client/", env!("CARGO_PKG_VERSION"));

/// `JobApi` over HTTP+JSON using reqwest.
#[derive(Debug, Clone)]
pub struct HttpJobApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ExternalJob>, AppError> {
        tracing::debug!(keyword = %query.keyword, page = query.page, "GET {}", query.path());
        let resp = self
            .client
            .get(self.url(query.path()))
            .header("Accept", "application/json")
            .query(&query.params())
            .send()
            .await?;

        // The service answers `null` when the provider has nothing for a page.
        let jobs: Option<Vec<ExternalJob>> = read_json(resp).await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn save(&self, payload: &JobPayload) -> Result<(), AppError> {
        tracing::debug!(apply_url = ?payload.apply_url, "POST /jobs/save");
        let resp = self
            .client
            .post(self.url("/jobs/save"))
            .json(payload)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn apply(&self, request: &ApplyRequest) -> Result<(), AppError> {
        tracing::debug!(?request, "POST /jobs/apply");
        let resp = self
            .client
            .post(self.url("/jobs/apply"))
            .json(request)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn list(&self, status: JobStatus) -> Result<Vec<TrackedJob>, AppError> {
        tracing::debug!(%status, "GET /jobs/{{status}}");
        let resp = self
            .client
            .get(self.url(&format!("/jobs/{}", status.as_path())))
            .header("Accept", "application/json")
            .send()
            .await?;
        let jobs: Option<Vec<TrackedJob>> = read_json(resp).await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn delete(&self, id: JobId) -> Result<(), AppError> {
        tracing::debug!(%id, "DELETE /jobs/{{id}}");
        let resp = self
            .client
            .delete(self.url(&format!("/jobs/{id}")))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }
}

/// Pass 2xx responses through; turn anything else into an error carrying
/// the status and raw body text.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %body, "Request rejected");
    Err(AppError::from_status(status.as_u16(), body))
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AppError> {
    let resp = check(resp).await?;
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let body = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(status, %body, "Failed to parse response: {e}");
        AppError::Decode {
            status,
            reason: e.to_string(),
        }
    })
}
