use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tracing::{info, warn};
use validator_core::config::ValidatorConfig;
use validator_core::errors::{Result, ValidatorError};
use validator_core::models::{
    DataFile, DataJob, DataOutputType, JobDataOutput, JobStatus, JobStatusResponse,
};
use validator_core::traits::JobStorage;
use validator_processor::ParallelProcessingCoordinator;

use crate::registry::JobRegistry;
use crate::supervisor::{CompletionCallback, JobSupervisor};

/// Facade managing job submission and status retrieval.
///
/// Job ids are strictly increasing, seeded from wall-clock time so ids do
/// not collide across restarts. The tracking cache holds job metadata only
/// while a job runs and is advisory: entries may be evicted at any time and
/// JobStorage stays the source of truth.
pub struct JobServer {
    job_id_seed: AtomicI64,
    storage: Arc<dyn JobStorage>,
    registry: JobRegistry,
    supervisor: JobSupervisor,
    tracking: Cache<i64, DataJob>,
}

impl JobServer {
    pub fn new(
        storage: Arc<dyn JobStorage>,
        coordinator: Arc<ParallelProcessingCoordinator>,
        config: &ValidatorConfig,
        completion_callback: Option<CompletionCallback>,
    ) -> Self {
        let registry = JobRegistry::new();
        let supervisor = JobSupervisor::new(
            coordinator,
            Arc::clone(&storage),
            registry.clone(),
            completion_callback,
        );
        let tracking = Cache::builder()
            .max_capacity(config.job_tracking_capacity)
            .time_to_idle(Duration::from_secs(config.job_tracking_idle_secs))
            .build();
        info!("new job server instance created");
        Self {
            job_id_seed: AtomicI64::new(Utc::now().timestamp_millis()),
            storage,
            registry,
            supervisor,
            tracking,
        }
    }

    /// Accepts a validation job and starts its supervised coordinator.
    /// Never blocks on the job's execution.
    pub async fn submit(&self, data_file: DataFile) -> JobStatusResponse {
        let job_id = self.job_id_seed.fetch_add(1, Ordering::SeqCst);
        let started_at = Utc::now();
        let data_file_key = data_file.key;

        let job = DataJob::new(job_id, started_at, data_file);
        self.tracking.insert(job_id, job.clone()).await;
        self.supervisor.start_job(job).await;

        info!(
            job_id,
            running = self.registry.running_jobs().await.len(),
            "job accepted"
        );
        JobStatusResponse::of_accepted(job_id, started_at, data_file_key)
    }

    /// Current status of a job. Durable storage is consulted first; a job
    /// absent from storage may still be running. Storage faults degrade to
    /// "not found in storage" and fall through to the live check.
    pub async fn status(&self, job_id: i64) -> JobStatusResponse {
        match self.storage.get_status(job_id).await {
            Ok(Some(status)) => return status,
            Ok(None) => {}
            Err(e) => {
                warn!(job_id, "job storage failed on status lookup: {e}");
            }
        }

        if self.registry.is_running(job_id).await {
            let tracked = self.tracking.get(&job_id).await;
            return JobStatusResponse::of_running(
                job_id,
                tracked.as_ref().map(|job| job.started_at),
                tracked.as_ref().map(|job| job.data_file.key),
            );
        }
        JobStatusResponse::of_not_found(job_id)
    }

    /// Best-effort kill: signals the live coordinator, persists a KILLED
    /// status built from whatever metadata is still cached (possibly none)
    /// and returns without waiting for in-flight workers. Killing a job
    /// with no live coordinator returns NOT_FOUND.
    pub async fn kill(&self, job_id: i64) -> JobStatusResponse {
        if !self.registry.kill(job_id).await {
            return JobStatusResponse::of_not_found(job_id);
        }

        let tracked = self.tracking.get(&job_id).await;
        let response = JobStatusResponse::of_killed(
            job_id,
            tracked.as_ref().map(|job| job.started_at),
            tracked.as_ref().map(|job| job.data_file.key),
        );
        if let Err(e) = self.storage.put(&response).await {
            warn!(job_id, "failed to persist KILLED status: {e}");
        }
        response
    }

    /// Downloadable artifact of a finished job; storage faults are treated
    /// as absence.
    pub async fn get_data_output(
        &self,
        job_id: i64,
        output_type: DataOutputType,
    ) -> Option<JobDataOutput> {
        match self.storage.get_data_output(job_id, output_type).await {
            Ok(output) => output,
            Err(e) => {
                warn!(job_id, "job storage failed on output lookup: {e}");
                None
            }
        }
    }

    /// Records a FAILED status for a job that could not even be started
    /// (e.g. a pre-submission validation error).
    pub async fn push_failed_job_status(&self, status: &JobStatusResponse) -> Result<()> {
        if status.status != JobStatus::Failed {
            return Err(ValidatorError::InvalidJobStatus {
                expected: "FAILED".to_string(),
                actual: format!("{:?}", status.status),
            });
        }
        self.storage.put(status).await
    }
}
