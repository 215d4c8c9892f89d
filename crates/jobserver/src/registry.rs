use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Cancellation handle of one running job.
pub struct JobHandle {
    kill_tx: watch::Sender<bool>,
}

impl JobHandle {
    /// Signals the job's coordinator to stop. Asynchronous: in-flight
    /// workers may run to completion and be discarded.
    pub fn kill(&self) {
        let _ = self.kill_tx.send(true);
    }

    pub fn is_killed(&self) -> bool {
        *self.kill_tx.borrow()
    }
}

/// Explicit map from job id to its cancellation handle. Each job task
/// registers itself at start and is removed at its terminal state, so
/// membership answers "is this job still running".
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<i64, Arc<JobHandle>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job and returns the receiver its coordinator watches for
    /// the kill signal.
    pub async fn register(&self, job_id: i64) -> watch::Receiver<bool> {
        let (kill_tx, kill_rx) = watch::channel(false);
        self.inner
            .write()
            .await
            .insert(job_id, Arc::new(JobHandle { kill_tx }));
        debug!(job_id, "job registered");
        kill_rx
    }

    /// Removes a job at its terminal state, returning the handle so the
    /// caller can tell whether the job had been killed.
    pub async fn remove(&self, job_id: i64) -> Option<Arc<JobHandle>> {
        let handle = self.inner.write().await.remove(&job_id);
        if handle.is_some() {
            debug!(job_id, "job removed from registry");
        }
        handle
    }

    pub async fn is_running(&self, job_id: i64) -> bool {
        self.inner.read().await.contains_key(&job_id)
    }

    /// Sends the kill signal to a running job. Returns false when no such
    /// job is registered (already finished or never existed).
    pub async fn kill(&self, job_id: i64) -> bool {
        match self.inner.read().await.get(&job_id) {
            Some(handle) => {
                handle.kill();
                true
            }
            None => false,
        }
    }

    pub async fn running_jobs(&self) -> Vec<i64> {
        self.inner.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_kill_remove_round_trip() {
        let registry = JobRegistry::new();
        let kill_rx = registry.register(7).await;

        assert!(registry.is_running(7).await);
        assert!(!*kill_rx.borrow());

        assert!(registry.kill(7).await);
        assert!(*kill_rx.borrow());

        let handle = registry.remove(7).await.unwrap();
        assert!(handle.is_killed());
        assert!(!registry.is_running(7).await);
    }

    #[tokio::test]
    async fn killing_unknown_job_is_a_no_op() {
        let registry = JobRegistry::new();
        assert!(!registry.kill(99).await);
        assert!(registry.remove(99).await.is_none());
    }
}
