use std::sync::Arc;

use tracing::{error, info, warn};
use validator_core::models::{DataJob, JobStatusResponse};
use validator_core::traits::JobStorage;
use validator_processor::ParallelProcessingCoordinator;

use crate::registry::JobRegistry;

/// Callback invoked when a job reaches a terminal state (completion does
/// not imply success, only that the job is done).
pub type CompletionCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Owns the coordinator lifecycle for submitted jobs: starts one supervised
/// task per job, persists the terminal status and relays completion.
pub struct JobSupervisor {
    coordinator: Arc<ParallelProcessingCoordinator>,
    storage: Arc<dyn JobStorage>,
    registry: JobRegistry,
    completion_callback: Option<CompletionCallback>,
}

impl JobSupervisor {
    pub fn new(
        coordinator: Arc<ParallelProcessingCoordinator>,
        storage: Arc<dyn JobStorage>,
        registry: JobRegistry,
        completion_callback: Option<CompletionCallback>,
    ) -> Self {
        Self {
            coordinator,
            storage,
            registry,
            completion_callback,
        }
    }

    /// Registers the job and spawns its coordinator task. Returns
    /// immediately; the job's outcome is persisted by the spawned task.
    pub async fn start_job(&self, job: DataJob) {
        let kill_rx = self.registry.register(job.job_id).await;

        let coordinator = Arc::clone(&self.coordinator);
        let storage = Arc::clone(&self.storage);
        let registry = self.registry.clone();
        let callback = self.completion_callback.clone();

        tokio::spawn(async move {
            let job_id = job.job_id;
            let started_at = job.started_at;

            // run the coordinator in its own task so a panic surfaces as a
            // join error instead of taking the supervisor down
            let outcome = tokio::spawn(async move {
                coordinator.process_data_file(&job, kill_rx).await
            })
            .await;

            let handle = registry.remove(job_id).await;
            let was_killed = handle.is_some_and(|h| h.is_killed());

            let terminal = match outcome {
                Ok(Ok(Some(report))) => {
                    if was_killed {
                        // kill already persisted a KILLED status; the late
                        // report is discarded
                        info!(job_id, "discarding report of a killed job");
                        None
                    } else {
                        Some(JobStatusResponse::of_finished(
                            job_id,
                            Some(started_at),
                            report,
                        ))
                    }
                }
                Ok(Ok(None)) => {
                    info!(job_id, "job stopped by kill signal");
                    None
                }
                Ok(Err(e)) => {
                    error!(job_id, "job failed: {e}");
                    Some(JobStatusResponse::of_failed(job_id, Some(started_at)))
                }
                Err(e) => {
                    error!(job_id, "coordinator task terminated abnormally: {e}");
                    Some(JobStatusResponse::of_failed(job_id, Some(started_at)))
                }
            };

            if let Some(status) = terminal {
                if let Err(e) = storage.put(&status).await {
                    warn!(job_id, "failed to persist terminal job status: {e}");
                }
            }

            if let Some(callback) = callback {
                callback(job_id);
            }
        });
    }
}
