use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use validator_core::errors::{Result, ValidatorError};
use validator_core::models::{DataOutputType, JobDataOutput, JobStatusResponse};
use validator_core::traits::JobStorage;

/// Volatile storage for tests and embedded use.
#[derive(Default)]
pub struct InMemoryJobStorage {
    statuses: Arc<RwLock<HashMap<i64, JobStatusResponse>>>,
}

impl InMemoryJobStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStorage for InMemoryJobStorage {
    async fn get_status(&self, job_id: i64) -> Result<Option<JobStatusResponse>> {
        Ok(self.statuses.read().await.get(&job_id).cloned())
    }

    async fn get_data_output(
        &self,
        job_id: i64,
        output_type: DataOutputType,
    ) -> Result<Option<JobDataOutput>> {
        let statuses = self.statuses.read().await;
        Ok(output_from_status(statuses.get(&job_id), job_id, output_type))
    }

    async fn put(&self, status: &JobStatusResponse) -> Result<()> {
        self.statuses
            .write()
            .await
            .insert(status.job_id, status.clone());
        Ok(())
    }
}

/// File-system storage: one JSON status document per job id under the
/// result storage directory.
pub struct FileSystemJobStorage {
    dir: PathBuf,
}

impl FileSystemJobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn status_path(&self, job_id: i64) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }
}

#[async_trait]
impl JobStorage for FileSystemJobStorage {
    async fn get_status(&self, job_id: i64) -> Result<Option<JobStatusResponse>> {
        let path = self.status_path(job_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ValidatorError::Storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        let status = serde_json::from_str(&content).map_err(|e| {
            ValidatorError::Storage(format!("corrupt status document {}: {e}", path.display()))
        })?;
        Ok(Some(status))
    }

    async fn get_data_output(
        &self,
        job_id: i64,
        output_type: DataOutputType,
    ) -> Result<Option<JobDataOutput>> {
        let status = self.get_status(job_id).await?;
        Ok(output_from_status(status.as_ref(), job_id, output_type))
    }

    async fn put(&self, status: &JobStatusResponse) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ValidatorError::Storage(format!("cannot create storage dir: {e}")))?;
        let path = self.status_path(status.job_id);
        let content = serde_json::to_string_pretty(status)
            .map_err(|e| ValidatorError::Storage(format!("cannot serialize status: {e}")))?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ValidatorError::Storage(format!("cannot write {}: {e}", path.display())))?;
        debug!(job_id = status.job_id, "persisted job status");
        Ok(())
    }
}

/// Derives a downloadable artifact from a stored terminal status. Only the
/// report artifact is materialized; other types are absent.
fn output_from_status(
    status: Option<&JobStatusResponse>,
    job_id: i64,
    output_type: DataOutputType,
) -> Option<JobDataOutput> {
    if output_type != DataOutputType::Report {
        return None;
    }
    let report = status.and_then(|s| s.result.as_ref())?;
    let content = serde_json::to_value(report).ok()?;
    Some(JobDataOutput {
        job_id,
        output_type,
        content,
    })
}
