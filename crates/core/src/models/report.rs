use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::data_file::{FileFormat, RowType};
use super::evaluation::{IssueType, ValidationIssue};

/// Upper bound of per-issue samples kept in a report section.
pub const MAX_ISSUE_SAMPLES: usize = 10;

/// One sampled occurrence of an issue, pointing back at the original file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueSample {
    pub line_number: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub related_data: BTreeMap<String, String>,
}

/// Aggregated view of one issue kind within a schema or checklist section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    pub issue: IssueType,
    pub count: u64,
    /// Up to [`MAX_ISSUE_SAMPLES`] examples, ordered by line number.
    pub samples: Vec<IssueSample>,
}

/// Aggregated statistics for one schema across all of its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub row_type: RowType,
    pub file_name: String,
    pub record_count: u64,
    /// Per-column count of records carrying a non-empty value.
    pub term_frequency: BTreeMap<String, u64>,
    pub issues: Vec<IssueSummary>,
    /// Chunks of this schema whose worker reported a failure; their records
    /// are missing from the counts above.
    pub failed_chunks: u32,
}

/// Result of the whole-collection checklist evaluation of a taxon file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistResult {
    pub file_name: String,
    /// Name usages inspected.
    pub usage_count: u64,
    pub issues: Vec<IssueSummary>,
}

/// The final report of a validation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// False when structural, integrity or metadata issues were found.
    /// Record-level findings do not make a resource invalid.
    pub valid: bool,
    pub source_file_name: String,
    pub file_format: FileFormat,
    /// Resource-scoped issues (structure, referential integrity, metadata).
    pub resource_issues: Vec<ValidationIssue>,
    /// One section per schema, built from the merged collectors.
    pub schema_reports: Vec<SchemaReport>,
    pub checklist_results: Vec<ChecklistResult>,
}

impl ValidationReport {
    /// Report for a job that short-circuited before any worker was started.
    pub fn of_issues(
        source_file_name: impl Into<String>,
        file_format: FileFormat,
        resource_issues: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            valid: false,
            source_file_name: source_file_name.into(),
            file_format,
            resource_issues,
            schema_reports: Vec::new(),
            checklist_results: Vec::new(),
        }
    }
}
