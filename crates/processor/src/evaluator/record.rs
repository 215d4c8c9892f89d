use validator_core::models::{IssueDetail, IssueType, RecordEvaluationResult, RowType};
use validator_core::traits::RecordEvaluator;

/// Term groups whose joint absence on a record is reported as a
/// completeness issue.
const TAXONOMIC_TERMS: &[&str] = &[
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "scientificName",
];
const GEOSPATIAL_TERMS: &[&str] = &["decimalLatitude", "decimalLongitude", "geodeticDatum"];
const TEMPORAL_TERMS: &[&str] = &["eventDate", "year", "month", "day"];

/// Flags records whose field count does not match the declared columns.
pub struct RecordStructureEvaluator {
    row_type: RowType,
    expected_columns: usize,
}

impl RecordStructureEvaluator {
    pub fn new(row_type: RowType, expected_columns: usize) -> Self {
        Self {
            row_type,
            expected_columns,
        }
    }
}

impl RecordEvaluator for RecordStructureEvaluator {
    fn evaluate(&self, line_number: Option<u64>, record: &[String]) -> Option<RecordEvaluationResult> {
        if record.len() == self.expected_columns {
            return None;
        }
        RecordEvaluationResult::builder(self.row_type.clone(), line_number)
            .add_detail(
                IssueDetail::new(IssueType::ColumnCountMismatch)
                    .with_related_data("expected", self.expected_columns.to_string())
                    .with_related_data("found", record.len().to_string()),
            )
            .build()
    }
}

/// Flags records missing every term of a taxonomic, geospatial or temporal
/// group.
pub struct CompletenessEvaluator {
    row_type: RowType,
    groups: Vec<(IssueType, Vec<usize>)>,
}

impl CompletenessEvaluator {
    pub fn new(row_type: RowType, columns: &[String]) -> Self {
        let indices_of = |terms: &[&str]| -> Vec<usize> {
            columns
                .iter()
                .enumerate()
                .filter(|(_, column)| {
                    terms.iter().any(|term| term.eq_ignore_ascii_case(column))
                })
                .map(|(idx, _)| idx)
                .collect()
        };
        Self {
            row_type,
            groups: vec![
                (IssueType::TaxonomicDataNotProvided, indices_of(TAXONOMIC_TERMS)),
                (IssueType::GeospatialDataNotProvided, indices_of(GEOSPATIAL_TERMS)),
                (IssueType::TemporalDataNotProvided, indices_of(TEMPORAL_TERMS)),
            ],
        }
    }
}

impl RecordEvaluator for CompletenessEvaluator {
    fn evaluate(&self, line_number: Option<u64>, record: &[String]) -> Option<RecordEvaluationResult> {
        let mut builder = RecordEvaluationResult::builder(self.row_type.clone(), line_number);
        for (issue, indices) in &self.groups {
            let any_filled = indices
                .iter()
                .filter_map(|&idx| record.get(idx))
                .any(|value| !value.trim().is_empty());
            if !any_filled {
                builder = builder.add_issue(*issue);
            }
        }
        builder.build()
    }
}

/// Runs several evaluators over the same record and merges their findings.
pub struct RecordEvaluatorChain {
    evaluators: Vec<Box<dyn RecordEvaluator>>,
}

impl RecordEvaluatorChain {
    pub fn new(evaluators: Vec<Box<dyn RecordEvaluator>>) -> Self {
        Self { evaluators }
    }
}

impl RecordEvaluator for RecordEvaluatorChain {
    fn evaluate(&self, line_number: Option<u64>, record: &[String]) -> Option<RecordEvaluationResult> {
        let results = self
            .evaluators
            .iter()
            .filter_map(|evaluator| evaluator.evaluate(line_number, record))
            .collect();
        RecordEvaluationResult::merge(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn structure_evaluator_flags_column_mismatch() {
        let evaluator = RecordStructureEvaluator::new(RowType::Occurrence, 3);
        assert!(evaluator.evaluate(Some(2), &record(&["a", "b", "c"])).is_none());

        let result = evaluator.evaluate(Some(2), &record(&["a", "b"])).unwrap();
        assert_eq!(result.details[0].issue, IssueType::ColumnCountMismatch);
        assert_eq!(result.details[0].related_data["expected"], "3");
        assert_eq!(result.details[0].related_data["found"], "2");
    }

    #[test]
    fn completeness_evaluator_flags_empty_groups() {
        let columns = vec![
            "occurrenceID".to_string(),
            "scientificName".to_string(),
            "decimalLatitude".to_string(),
            "eventDate".to_string(),
        ];
        let evaluator = CompletenessEvaluator::new(RowType::Occurrence, &columns);

        // all groups provided
        assert!(evaluator
            .evaluate(Some(2), &record(&["1", "Puma concolor", "55.1", "2001"]))
            .is_none());

        // temporal and geospatial empty
        let result = evaluator
            .evaluate(Some(3), &record(&["1", "Puma concolor", "", ""]))
            .unwrap();
        let issues: Vec<_> = result.details.iter().map(|d| d.issue).collect();
        assert!(issues.contains(&IssueType::GeospatialDataNotProvided));
        assert!(issues.contains(&IssueType::TemporalDataNotProvided));
        assert!(!issues.contains(&IssueType::TaxonomicDataNotProvided));
    }

    #[test]
    fn chain_merges_findings_of_all_evaluators() {
        let columns = vec!["occurrenceID".to_string(), "scientificName".to_string()];
        let chain = RecordEvaluatorChain::new(vec![
            Box::new(RecordStructureEvaluator::new(RowType::Occurrence, 2)),
            Box::new(CompletenessEvaluator::new(RowType::Occurrence, &columns)),
        ]);

        let result = chain.evaluate(Some(5), &record(&["1"])).unwrap();
        let issues: Vec<_> = result.details.iter().map(|d| d.issue).collect();
        assert!(issues.contains(&IssueType::ColumnCountMismatch));
        assert!(issues.contains(&IssueType::GeospatialDataNotProvided));
    }
}
