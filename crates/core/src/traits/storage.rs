use async_trait::async_trait;

use crate::errors::Result;
use crate::models::job::JobStatusResponse;
use crate::models::output::{DataOutputType, JobDataOutput};

/// Durable key-value store of job results. The only durability boundary of
/// the engine; queried ids may be unknown (returns `Ok(None)`, not an error).
#[async_trait]
pub trait JobStorage: Send + Sync {
    async fn get_status(&self, job_id: i64) -> Result<Option<JobStatusResponse>>;

    async fn get_data_output(
        &self,
        job_id: i64,
        output_type: DataOutputType,
    ) -> Result<Option<JobDataOutput>>;

    async fn put(&self, status: &JobStatusResponse) -> Result<()>;
}
