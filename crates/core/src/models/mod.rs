pub mod data_file;
pub mod evaluation;
pub mod job;
pub mod output;
pub mod report;

pub use data_file::{DataFile, FileFormat, PreparedDataFile, RowType};
pub use evaluation::{IssueDetail, IssueType, RecordEvaluationResult, ValidationIssue};
pub use job::{DataJob, JobStatus, JobStatusResponse};
pub use output::{DataOutputType, JobDataOutput};
pub use report::{
    ChecklistResult, IssueSample, IssueSummary, SchemaReport, ValidationReport, MAX_ISSUE_SAMPLES,
};
