use std::collections::BTreeMap;

use validator_core::models::report::{IssueSample, IssueSummary, SchemaReport, MAX_ISSUE_SAMPLES};
use validator_core::models::{DataFile, IssueType, RecordEvaluationResult, RowType};

/// Mergeable accumulator of per-record statistics for one schema.
///
/// One instance exists per chunk; the coordinator folds all instances of a
/// schema with [`CollectorGroup::merge_with`], in whatever order chunk
/// results arrive. The merge is associative and commutative: counts add up
/// and samples are kept as the lowest line numbers across both sides.
#[derive(Debug, Clone)]
pub struct CollectorGroup {
    row_type: RowType,
    columns: Vec<String>,
    record_count: u64,
    term_frequency: BTreeMap<String, u64>,
    issue_counts: BTreeMap<IssueType, u64>,
    issue_samples: BTreeMap<IssueType, Vec<IssueSample>>,
    failed_chunks: u32,
}

impl CollectorGroup {
    pub fn new(row_type: RowType, columns: Vec<String>) -> Self {
        Self {
            row_type,
            columns,
            record_count: 0,
            term_frequency: BTreeMap::new(),
            issue_counts: BTreeMap::new(),
            issue_samples: BTreeMap::new(),
            failed_chunks: 0,
        }
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn failed_chunks(&self) -> u32 {
        self.failed_chunks
    }

    /// Accounts one raw record: total count plus per-column fill frequency.
    pub fn accumulate_record(&mut self, record: &[String]) {
        self.record_count += 1;
        for (column, value) in self.columns.iter().zip(record.iter()) {
            if !value.trim().is_empty() {
                *self.term_frequency.entry(column.clone()).or_insert(0) += 1;
            }
        }
    }

    /// Accounts the findings of one evaluated record.
    pub fn accumulate(&mut self, result: &RecordEvaluationResult) {
        for detail in &result.details {
            *self.issue_counts.entry(detail.issue).or_insert(0) += 1;
            let samples = self.issue_samples.entry(detail.issue).or_default();
            if samples.len() < MAX_ISSUE_SAMPLES {
                samples.push(IssueSample {
                    line_number: result.line_number,
                    related_data: detail.related_data.clone(),
                });
            }
        }
    }

    /// Records a chunk whose worker failed; its records are absent from all
    /// counts and the gap is surfaced in the report section.
    pub fn record_failed_chunk(&mut self) {
        self.failed_chunks += 1;
    }

    /// Combines another instance of the same schema into this one. Merging
    /// order must not affect the outcome.
    pub fn merge_with(&mut self, other: CollectorGroup) {
        self.record_count += other.record_count;
        self.failed_chunks += other.failed_chunks;
        for (term, count) in other.term_frequency {
            *self.term_frequency.entry(term).or_insert(0) += count;
        }
        for (issue, count) in other.issue_counts {
            *self.issue_counts.entry(issue).or_insert(0) += count;
        }
        for (issue, samples) in other.issue_samples {
            let merged = self.issue_samples.entry(issue).or_default();
            merged.extend(samples);
            merged.sort_by(|a, b| {
                let key = |s: &IssueSample| (s.line_number.unwrap_or(u64::MAX), s.related_data.clone());
                key(a).cmp(&key(b))
            });
            merged.truncate(MAX_ISSUE_SAMPLES);
        }
    }

    /// Finalizes the merged statistics into the schema's report section.
    pub fn into_schema_report(self, schema_file: &DataFile) -> SchemaReport {
        let Self {
            row_type,
            columns: _,
            record_count,
            term_frequency,
            issue_counts,
            mut issue_samples,
            failed_chunks,
        } = self;

        let mut issues: Vec<IssueSummary> = issue_counts
            .into_iter()
            .map(|(issue, count)| IssueSummary {
                issue,
                count,
                samples: issue_samples.remove(&issue).unwrap_or_default(),
            })
            .collect();
        if failed_chunks > 0 {
            issues.push(IssueSummary {
                issue: IssueType::ChunkProcessingFailed,
                count: u64::from(failed_chunks),
                samples: Vec::new(),
            });
        }
        SchemaReport {
            row_type,
            file_name: schema_file.source_file_name.clone(),
            record_count,
            term_frequency,
            issues,
            failed_chunks,
        }
    }
}

/// Factory handed to workers so each chunk gets its own collector instance.
#[derive(Debug, Clone)]
pub struct CollectorGroupProvider {
    row_type: RowType,
    columns: Vec<String>,
}

impl CollectorGroupProvider {
    pub fn new(row_type: RowType, columns: Vec<String>) -> Self {
        Self { row_type, columns }
    }

    pub fn provide(&self) -> CollectorGroup {
        CollectorGroup::new(self.row_type.clone(), self.columns.clone())
    }
}

/// Folds record evaluation results into per-issue summaries, used by the
/// whole-collection evaluators whose findings bypass chunk collectors.
pub fn summarize_issues(results: &[RecordEvaluationResult]) -> Vec<IssueSummary> {
    let mut counts: BTreeMap<IssueType, u64> = BTreeMap::new();
    let mut samples: BTreeMap<IssueType, Vec<IssueSample>> = BTreeMap::new();
    for result in results {
        for detail in &result.details {
            *counts.entry(detail.issue).or_insert(0) += 1;
            let entry = samples.entry(detail.issue).or_default();
            if entry.len() < MAX_ISSUE_SAMPLES {
                entry.push(IssueSample {
                    line_number: result.line_number,
                    related_data: detail.related_data.clone(),
                });
            }
        }
    }
    counts
        .into_iter()
        .map(|(issue, count)| IssueSummary {
            issue,
            count,
            samples: samples.remove(&issue).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::models::{FileFormat, IssueDetail};

    fn group() -> CollectorGroup {
        CollectorGroup::new(
            RowType::Occurrence,
            vec!["occurrenceID".into(), "scientificName".into(), "eventDate".into()],
        )
    }

    fn result(line: u64, issue: IssueType) -> RecordEvaluationResult {
        RecordEvaluationResult::builder(RowType::Occurrence, Some(line))
            .add_detail(IssueDetail::new(issue))
            .build()
            .unwrap()
    }

    #[test]
    fn accumulates_term_frequency_of_filled_values() {
        let mut g = group();
        g.accumulate_record(&["id-1".into(), "Puma concolor".into(), "".into()]);
        g.accumulate_record(&["id-2".into(), "  ".into(), "2001-03-04".into()]);

        assert_eq!(g.record_count(), 2);
        assert_eq!(g.term_frequency.get("occurrenceID"), Some(&2));
        assert_eq!(g.term_frequency.get("scientificName"), Some(&1));
        assert_eq!(g.term_frequency.get("eventDate"), Some(&1));
    }

    #[test]
    fn merge_is_commutative() {
        let build_pair = || {
            let mut a = group();
            a.accumulate_record(&["id-1".into(), "Puma concolor".into(), "".into()]);
            a.accumulate(&result(3, IssueType::TemporalDataNotProvided));
            let mut b = group();
            b.accumulate_record(&["id-2".into(), "".into(), "2001".into()]);
            b.accumulate(&result(47, IssueType::TemporalDataNotProvided));
            b.accumulate(&result(48, IssueType::ColumnCountMismatch));
            (a, b)
        };

        let (a1, b1) = build_pair();
        let (a2, b2) = build_pair();
        let mut ab = a1;
        ab.merge_with(b1);
        let mut ba = b2;
        ba.merge_with(a2);

        assert_eq!(ab.record_count, ba.record_count);
        assert_eq!(ab.term_frequency, ba.term_frequency);
        assert_eq!(ab.issue_counts, ba.issue_counts);
        assert_eq!(ab.issue_samples, ba.issue_samples);
    }

    #[test]
    fn merge_keeps_lowest_line_samples() {
        let mut a = group();
        for line in 100..100 + MAX_ISSUE_SAMPLES as u64 {
            a.accumulate(&result(line, IssueType::ColumnCountMismatch));
        }
        let mut b = group();
        b.accumulate(&result(7, IssueType::ColumnCountMismatch));

        a.merge_with(b);
        let samples = &a.issue_samples[&IssueType::ColumnCountMismatch];
        assert_eq!(samples.len(), MAX_ISSUE_SAMPLES);
        assert_eq!(samples[0].line_number, Some(7));
    }

    #[test]
    fn failed_chunks_surface_in_report() {
        let mut g = group();
        g.accumulate_record(&["id-1".into(), "x".into(), "y".into()]);
        g.record_failed_chunk();

        let df = DataFile::new("occ.tsv", "/tmp/occ.tsv", FileFormat::Tabular, b'\t', true);
        let report = g.into_schema_report(&df);

        assert_eq!(report.failed_chunks, 1);
        assert!(report
            .issues
            .iter()
            .any(|i| i.issue == IssueType::ChunkProcessingFailed && i.count == 1));
    }
}
