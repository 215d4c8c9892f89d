use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::data_file::RowType;

/// Catalog of conditions the evaluators can report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    // resource structure
    UnreadableDataFile,
    InvalidArchiveLayout,
    ManifestEntryMissing,
    CoreFileMissing,

    // whole-collection integrity
    RecordNotUniquelyIdentified,
    RecordReferentialIntegrityViolation,

    // checklist
    DuplicatedTaxonId,
    ScientificNameMissing,
    ParentNameUsageIdUnresolved,

    // per record
    ColumnCountMismatch,
    TaxonomicDataNotProvided,
    GeospatialDataNotProvided,
    TemporalDataNotProvided,

    // coordinator diagnostics
    ChunkProcessingFailed,
}

/// An issue scoped to the resource as a whole (structure, integrity,
/// metadata), as opposed to a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub issue: IssueType,
    pub related_row_type: Option<RowType>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(issue: IssueType, message: impl Into<String>) -> Self {
        Self {
            issue,
            related_row_type: None,
            message: message.into(),
        }
    }

    pub fn of_row_type(issue: IssueType, row_type: RowType, message: impl Into<String>) -> Self {
        Self {
            issue,
            related_row_type: Some(row_type),
            message: message.into(),
        }
    }
}

/// One finding within a record evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetail {
    pub issue: IssueType,
    /// Verbatim values related to the finding, keyed by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub related_data: BTreeMap<String, String>,
}

impl IssueDetail {
    pub fn new(issue: IssueType) -> Self {
        Self {
            issue,
            related_data: BTreeMap::new(),
        }
    }

    pub fn with_related_data(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.related_data.insert(column.into(), value.into());
        self
    }
}

/// Outcome of evaluating one record.
///
/// Line numbers are relative to the originating file; chunk workers add the
/// chunk's line offset so diagnostics map back to the submitted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEvaluationResult {
    pub line_number: Option<u64>,
    pub row_type: Option<RowType>,
    pub details: Vec<IssueDetail>,
}

impl RecordEvaluationResult {
    pub fn builder(row_type: RowType, line_number: Option<u64>) -> RecordEvaluationResultBuilder {
        RecordEvaluationResultBuilder {
            line_number,
            row_type: Some(row_type),
            details: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Merges several evaluator outputs for the same record into one result.
    pub fn merge(results: Vec<RecordEvaluationResult>) -> Option<RecordEvaluationResult> {
        let mut iter = results.into_iter();
        let mut merged = iter.next()?;
        for result in iter {
            merged.details.extend(result.details);
        }
        (!merged.is_empty()).then_some(merged)
    }
}

pub struct RecordEvaluationResultBuilder {
    line_number: Option<u64>,
    row_type: Option<RowType>,
    details: Vec<IssueDetail>,
}

impl RecordEvaluationResultBuilder {
    pub fn add_detail(mut self, detail: IssueDetail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn add_issue(self, issue: IssueType) -> Self {
        self.add_detail(IssueDetail::new(issue))
    }

    /// Returns `None` when no detail was recorded; evaluators use this to
    /// signal "no finding" without allocating empty results.
    pub fn build(self) -> Option<RecordEvaluationResult> {
        if self.details.is_empty() {
            return None;
        }
        Some(RecordEvaluationResult {
            line_number: self.line_number,
            row_type: self.row_type,
            details: self.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_returns_none_without_details() {
        assert!(RecordEvaluationResult::builder(RowType::Occurrence, Some(3))
            .build()
            .is_none());
    }

    #[test]
    fn merge_concatenates_details() {
        let a = RecordEvaluationResult::builder(RowType::Occurrence, Some(7))
            .add_issue(IssueType::ColumnCountMismatch)
            .build()
            .unwrap();
        let b = RecordEvaluationResult::builder(RowType::Occurrence, Some(7))
            .add_issue(IssueType::TemporalDataNotProvided)
            .build()
            .unwrap();

        let merged = RecordEvaluationResult::merge(vec![a, b]).unwrap();
        assert_eq!(merged.details.len(), 2);
        assert_eq!(merged.line_number, Some(7));
    }
}
