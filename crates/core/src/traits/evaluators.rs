use crate::errors::Result;
use crate::models::data_file::{DataFile, PreparedDataFile};
use crate::models::evaluation::{RecordEvaluationResult, ValidationIssue};

/// Evaluates one record represented as its raw field values.
pub trait RecordEvaluator: Send + Sync {
    /// `line_number` is relative to the originating file and may be absent.
    /// Returns `None` when the record raises no finding.
    fn evaluate(&self, line_number: Option<u64>, record: &[String]) -> Option<RecordEvaluationResult>;
}

/// Validates the structure of a resource before any record is read. Pure:
/// an issue is a validation outcome, an `Err` is a system fault.
pub trait ResourceStructureEvaluator: Send + Sync {
    fn evaluate(&self, data_file: &DataFile) -> Result<Option<ValidationIssue>>;
}

/// A check that must see an entire schema's records together (uniqueness,
/// referential integrity, checklist normalization).
pub trait CollectionEvaluator: Send + Sync {
    /// `target` is the schema file under evaluation; `prepared` gives access
    /// to sibling schemas (e.g. the core for referential integrity).
    fn evaluate(
        &self,
        prepared: &PreparedDataFile,
        target: &DataFile,
    ) -> Result<Vec<RecordEvaluationResult>>;
}

/// Whole-archive content check (descriptor/metadata sanity).
pub trait MetadataEvaluator: Send + Sync {
    fn evaluate(&self, prepared: &PreparedDataFile) -> Result<Vec<ValidationIssue>>;
}
