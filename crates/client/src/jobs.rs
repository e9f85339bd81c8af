//! REST client for the relay's job gateway.
//!
//! Sharing a file first registers a `file_upload` job over HTTP, then
//! follows it with `GET /jobs/{id}` until it settles.

use std::time::Duration;

use relay_core::job::{FileUploadPayload, Job, JobType};
use serde_json::Value;

use crate::error::ClientError;

/// Default interval between job status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// HTTP client for one relay API instance.
#[derive(Debug, Clone)]
pub struct JobsClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl JobsClient {
    /// Create a client for `base_url`, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Register a `file_upload` job carrying `payload`.
    pub async fn create_file_upload(&self, payload: &FileUploadPayload) -> Result<Job, ClientError> {
        let body = serde_json::json!({
            "type": JobType::FileUpload,
            "payload": payload,
        });

        let response = self
            .http
            .post(format!("{}/jobs", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of one job.
    pub async fn get_job(&self, id: &str) -> Result<Job, ClientError> {
        let response = self
            .http
            .get(format!("{}/jobs/{}", self.base_url, id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Poll `id` until it reaches `completed` or `failed`.
    ///
    /// The first poll happens one interval after the call. Any failed poll
    /// ends the wait with that error.
    pub async fn wait_for_completion(&self, id: &str) -> Result<Job, ClientError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let job = self.get_job(id).await?;
            tracing::debug!(job_id = %id, status = %job.status, "Polled job");
            if job.status.has_result() {
                return Ok(job);
            }
        }
    }

    // ---- private helpers ----

    /// Decode a 2xx JSON body, or turn the gateway's `{error}` body into
    /// [`ClientError::Api`].
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}
