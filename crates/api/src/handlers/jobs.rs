//! Handlers for the `/jobs` resource.
//!
//! Jobs are created `pending` and picked up by the scheduler; clients poll
//! `GET /jobs/{id}` to follow them to `completed`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use relay_core::error::CoreError;
use relay_core::job::{Job, JobPayload, JobType};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of `POST /jobs`.
///
/// Both fields are loose JSON so that a wrong shape is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type")]
    pub job_type: Option<Value>,
    pub payload: Option<Value>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /jobs
///
/// Create a new job. Returns 201 with the created job, or 400 when the
/// type is missing or unknown, or the payload is missing or falsy.
pub async fn create_job(
    State(state): State<AppState>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let job_type: JobType = input
        .job_type
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::Validation("Invalid job type".into()))?
        .parse()?;
    let payload = JobPayload::from_value(job_type, input.payload)?;

    let job = Job::new(job_type, payload);
    state.store.create_job(job.clone());

    tracing::info!(job_id = %job.id, job_type = %job.job_type, "Job created");

    Ok((StatusCode::CREATED, Json(job)))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<Job>> {
    match state.store.get_job(&job_id) {
        Some(job) => {
            tracing::debug!(job_id = %job_id, status = %job.status, "Job retrieved");
            Ok(Json(job))
        }
        None => {
            tracing::warn!(job_id = %job_id, "Job not found");
            Err(AppError::Core(CoreError::NotFound {
                entity: "Job",
                id: job_id,
            }))
        }
    }
}

/// GET /jobs
///
/// All jobs in creation order.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.store.list_jobs())
}
