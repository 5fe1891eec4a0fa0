//! Video transcoding service adapter
//!
//! The pipeline only needs a narrow contract from the service: issue direct-upload
//! tickets, report job state, derive delivery URLs and delete jobs.

#[cfg(feature = "memory")]
mod memory;
mod stream;

#[cfg(feature = "memory")]
pub use memory::MemoryTranscoder;
pub use stream::StreamApiClient;

use async_trait::async_trait;
use quill_core::models::ProcessingStatus;
use quill_core::AppError;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscoderError {
    #[error("Transcoding service request failed: {0}")]
    Request(String),

    #[error("Transcoding service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected transcoding service response: {0}")]
    InvalidResponse(String),

    #[error("Transcoder configuration error: {0}")]
    Config(String),
}

impl TranscoderError {
    /// Status code returned by the service, when the failure came from it.
    pub fn status(&self) -> Option<u16> {
        match self {
            TranscoderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TranscoderError {
    fn from(err: reqwest::Error) -> Self {
        TranscoderError::Request(err.to_string())
    }
}

impl From<TranscoderError> for AppError {
    fn from(err: TranscoderError) -> Self {
        match err {
            TranscoderError::Config(msg) => AppError::Internal(msg),
            other => AppError::Transcoder(other.to_string()),
        }
    }
}

pub type TranscoderResult<T> = Result<T, TranscoderError>;

/// Job state as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    PendingUpload,
    Downloading,
    Queued,
    InProgress,
    Ready,
    Error,
    Unknown(String),
}

impl JobState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pendingupload" => JobState::PendingUpload,
            "downloading" => JobState::Downloading,
            "queued" => JobState::Queued,
            "inprogress" => JobState::InProgress,
            "ready" => JobState::Ready,
            "error" => JobState::Error,
            _ => JobState::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobState::PendingUpload => "pendingupload",
            JobState::Downloading => "downloading",
            JobState::Queued => "queued",
            JobState::InProgress => "inprogress",
            JobState::Ready => "ready",
            JobState::Error => "error",
            JobState::Unknown(raw) => raw,
        }
    }

    /// Stored status this job state corresponds to. Unknown states map to nothing and
    /// leave the stored record alone.
    pub fn processing_status(&self) -> Option<ProcessingStatus> {
        match self {
            JobState::PendingUpload => Some(ProcessingStatus::Uploading),
            JobState::Downloading | JobState::Queued | JobState::InProgress => {
                Some(ProcessingStatus::Processing)
            }
            JobState::Ready => Some(ProcessingStatus::Ready),
            JobState::Error => Some(ProcessingStatus::Error),
            JobState::Unknown(_) => None,
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Parameters for a resumable (tus) direct-upload ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectUploadRequest {
    pub ttl: Duration,
    pub max_duration_secs: u64,
    /// Total size of the file the client will upload, in bytes.
    pub upload_length: u64,
    /// Id of the user the job is recorded against.
    pub creator: Option<String>,
    /// Free-form metadata stored on the job (e.g. `name`).
    pub meta: BTreeMap<String, String>,
}

/// A tus upload URL plus the id of the job it feeds. The client sends the bytes in
/// `PATCH` chunks and can resume from the offset the URL reports.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectUpload {
    pub upload_url: String,
    pub external_uid: String,
}

/// Snapshot of a transcoding job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetails {
    pub external_uid: String,
    pub state: JobState,
    pub duration_seconds: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size_bytes: Option<i64>,
    pub error_reason: Option<String>,
    pub thumbnail_url: Option<String>,
    /// The job document exactly as the service returned it.
    pub raw: JsonValue,
}

impl JobDetails {
    /// Details for a job in `state` with nothing else known.
    pub fn new(external_uid: impl Into<String>, state: JobState) -> Self {
        Self {
            external_uid: external_uid.into(),
            state,
            duration_seconds: None,
            width: None,
            height: None,
            size_bytes: None,
            error_reason: None,
            thumbnail_url: None,
            raw: JsonValue::Null,
        }
    }
}

#[async_trait]
pub trait TranscodingService: Send + Sync {
    /// Request a resumable direct-upload ticket; bytes then go from the client straight
    /// to the service.
    async fn create_direct_upload(
        &self,
        request: DirectUploadRequest,
    ) -> TranscoderResult<DirectUpload>;

    /// Current job details, or `None` when the service has no such job.
    async fn get_job_details(&self, external_uid: &str) -> TranscoderResult<Option<JobDetails>>;

    fn thumbnail_url(&self, external_uid: &str) -> String;

    fn playback_url(&self, external_uid: &str) -> String;

    /// Delete the job and its renditions. Missing jobs are not an error.
    async fn delete_job(&self, external_uid: &str) -> TranscoderResult<()>;
}
