//! Job entity and its processing lifecycle.
//!
//! A job moves `pending -> processing -> completed`. The `failed` status is
//! part of the wire vocabulary but nothing in the relay currently produces it.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{new_id, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether a job in this status carries a [`JobResult`].
    pub fn has_result(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Type
// ---------------------------------------------------------------------------

/// Kind of work a job represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FileUpload,
    ChatMessage,
}

impl JobType {
    /// Every recognised job type, in declaration order.
    pub const ALL: [JobType; 2] = [JobType::FileUpload, JobType::ChatMessage];

    /// Wire name of the job type.
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FileUpload => "file_upload",
            JobType::ChatMessage => "chat_message",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation("Invalid job type".into()))
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Payload of a `file_upload` job.
///
/// Only an object with exactly these four keys decodes as this type, so a
/// payload with extra keys is kept opaque and round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileUploadPayload {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// Base64-encoded file contents.
    pub data: String,
}

/// Job payload, keyed by the job's [`JobType`].
///
/// Serialized untagged: the JSON is exactly what the client submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobPayload {
    FileUpload(FileUploadPayload),
    /// Any payload without a dedicated shape, kept verbatim.
    Opaque(Value),
}

impl JobPayload {
    /// Build a payload for `job_type` from raw request JSON.
    ///
    /// A missing or falsy value (`null`, `false`, `0`, `""`) is rejected.
    /// A `file_upload` body that does not match [`FileUploadPayload`]
    /// exactly, missing keys or extra keys alike, is accepted and kept opaque.
    pub fn from_value(job_type: JobType, value: Option<Value>) -> Result<Self, CoreError> {
        let value = match value {
            Some(v) if !is_falsy(&v) => v,
            _ => return Err(CoreError::Validation("Payload is required".into())),
        };

        match job_type {
            JobType::FileUpload => {
                match serde_json::from_value::<FileUploadPayload>(value.clone()) {
                    Ok(file) => Ok(JobPayload::FileUpload(file)),
                    Err(_) => Ok(JobPayload::Opaque(value)),
                }
            }
            JobType::ChatMessage => Ok(JobPayload::Opaque(value)),
        }
    }

    /// The `fileName` carried by the payload, if it is a string.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            JobPayload::FileUpload(file) => Some(&file.file_name),
            JobPayload::Opaque(value) => value.get("fileName").and_then(Value::as_str),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Outcome attached to a job once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub processed_at: Timestamp,
    pub message: String,
}

/// A unit of asynchronous work tracked through its status lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: EntityId,
    pub status: JobStatus,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub payload: JobPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Create a new pending job with a fresh id.
    pub fn new(job_type: JobType, payload: JobPayload) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            status: JobStatus::Pending,
            job_type,
            payload,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the job into `processing`.
    ///
    /// Any result left over from an earlier run is cleared so a processing
    /// job never carries one.
    pub fn into_processing(self) -> Self {
        Self {
            status: JobStatus::Processing,
            result: None,
            updated_at: Utc::now(),
            ..self
        }
    }

    /// Move the job into `completed` with the given result message.
    pub fn into_completed(self, message: String) -> Self {
        let now = Utc::now();
        Self {
            status: JobStatus::Completed,
            result: Some(JobResult {
                processed_at: now,
                message,
            }),
            updated_at: now,
            ..self
        }
    }

    /// Human-readable message describing a successful run of this job.
    pub fn completion_message(&self) -> String {
        match (self.job_type, self.payload.file_name()) {
            (JobType::FileUpload, Some(file_name)) => {
                format!("File {file_name} processed successfully")
            }
            _ => format!("Job {} processed successfully", self.id),
        }
    }
}
