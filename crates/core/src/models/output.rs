use serde::{Deserialize, Serialize};

/// Kinds of artifacts a finished job can expose for download.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataOutputType {
    Report,
    Metrics,
}

/// A downloadable artifact of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDataOutput {
    pub job_id: i64,
    pub output_type: DataOutputType,
    pub content: serde_json::Value,
}
