use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_file::DataFile;
use super::report::ValidationReport;

/// One accepted unit of work. Immutable after creation; the job server keeps
/// it in the tracking cache only while the job runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataJob {
    pub job_id: i64,
    pub started_at: DateTime<Utc>,
    pub data_file: DataFile,
}

impl DataJob {
    pub fn new(job_id: i64, started_at: DateTime<Utc>, data_file: DataFile) -> Self {
        Self {
            job_id,
            started_at,
            data_file,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Accepted,
    Running,
    Finished,
    Failed,
    Killed,
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Killed
        )
    }
}

/// Point-in-time job state returned to clients and persisted at terminal
/// transitions. `NOT_FOUND` is synthesized for queries, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: i64,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// Caller-visible key of the submitted data file; may be absent when the
    /// tracking cache entry already expired.
    pub data_file_key: Option<Uuid>,
    pub result: Option<ValidationReport>,
}

impl JobStatusResponse {
    pub fn of_accepted(job_id: i64, started_at: DateTime<Utc>, data_file_key: Uuid) -> Self {
        Self {
            job_id,
            status: JobStatus::Accepted,
            started_at: Some(started_at),
            data_file_key: Some(data_file_key),
            result: None,
        }
    }

    pub fn of_running(
        job_id: i64,
        started_at: Option<DateTime<Utc>>,
        data_file_key: Option<Uuid>,
    ) -> Self {
        Self {
            job_id,
            status: JobStatus::Running,
            started_at,
            data_file_key,
            result: None,
        }
    }

    pub fn of_finished(job_id: i64, started_at: Option<DateTime<Utc>>, result: ValidationReport) -> Self {
        Self {
            job_id,
            status: JobStatus::Finished,
            started_at,
            data_file_key: None,
            result: Some(result),
        }
    }

    pub fn of_failed(job_id: i64, started_at: Option<DateTime<Utc>>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            started_at,
            data_file_key: None,
            result: None,
        }
    }

    pub fn of_killed(
        job_id: i64,
        started_at: Option<DateTime<Utc>>,
        data_file_key: Option<Uuid>,
    ) -> Self {
        Self {
            job_id,
            status: JobStatus::Killed,
            started_at,
            data_file_key,
            result: None,
        }
    }

    pub fn of_not_found(job_id: i64) -> Self {
        Self {
            job_id,
            status: JobStatus::NotFound,
            started_at: None,
            data_file_key: None,
            result: None,
        }
    }
}
