//! Shared data model, error type, configuration and collaborator traits of
//! the datapack validation job engine.

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::ValidatorConfig;
pub use errors::{Result, ValidatorError};
pub use models::{
    ChecklistResult, DataFile, DataJob, DataOutputType, FileFormat, IssueDetail, IssueSample,
    IssueSummary, IssueType, JobDataOutput, JobStatus, JobStatusResponse, PreparedDataFile,
    RecordEvaluationResult, RowType, SchemaReport, ValidationIssue, ValidationReport,
};
pub use traits::{
    CollectionEvaluator, JobStorage, MetadataEvaluator, RecordEvaluator, RecordSource,
    ResourceStructureEvaluator, SourcePreparer,
};
