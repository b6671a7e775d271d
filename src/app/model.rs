use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cli::ExplainEngine;
use crate::document::{AnnotatedDocument, Document};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// One run of the annotation pipeline. Exactly one worker writes a job;
/// pollers only read. `data` is present only once the job is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub data: Option<AnnotatedDocument>,

    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Replacement values for a job's mutable fields. An update replaces all four
/// fields at once, so an update without a message clears any previous one.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub data: Option<AnnotatedDocument>,
}

impl JobUpdate {
    pub fn processing(progress: u8) -> Self {
        Self {
            status: JobStatus::Processing,
            progress: Some(progress),
            message: None,
            data: None,
        }
    }

    pub fn complete(data: AnnotatedDocument) -> Self {
        Self {
            status: JobStatus::Complete,
            progress: Some(100),
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            progress: None,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Everything a job needs, captured at launch time. The launcher consumes the
/// request and hands the worker this snapshot; the worker never reads caller
/// state afterward.
#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub document: Document,
    /// Display identity of the requester, embedded in every prompt.
    pub identity: String,

    pub engine: ExplainEngine,
    pub api_key: String,
    pub model: String,
    pub base_url: String,

    /// Pause after each successful generator call, bounding request rate.
    pub delay_ms: u64,
}

impl StartJobRequest {
    pub fn default_model() -> String {
        crate::openai::DEFAULT_MODEL.to_owned()
    }
    pub fn default_base_url() -> String {
        crate::openai::DEFAULT_BASE_URL.to_owned()
    }
    pub fn default_delay_ms() -> u64 {
        1500
    }
}

/// Status as reported to pollers: the job statuses plus a distinguished
/// `not_found` for unknown or expired job ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportedStatus {
    NotFound,
    Pending,
    Processing,
    Complete,
    Failed,
}

impl From<JobStatus> for ReportedStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => Self::Pending,
            JobStatus::Processing => Self::Processing,
            JobStatus::Complete => Self::Complete,
            JobStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: ReportedStatus,
    pub progress: Option<u8>,
    pub message: Option<String>,
}

impl JobStatusReport {
    pub fn not_found() -> Self {
        Self {
            status: ReportedStatus::NotFound,
            progress: None,
            message: None,
        }
    }
}

impl From<&Job> for JobStatusReport {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status.into(),
            progress: job.progress,
            message: job.message.clone(),
        }
    }
}
