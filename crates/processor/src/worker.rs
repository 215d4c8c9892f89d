use tracing::debug;
use validator_core::errors::Result;
use validator_core::models::{ChecklistResult, DataFile, PreparedDataFile};
use validator_core::traits::{CollectionEvaluator, RecordEvaluator};

use crate::collector::{summarize_issues, CollectorGroup, CollectorGroupProvider};
use crate::source::reader::{open_record_source, record_line_base};

/// Outcome of one worker processing one chunk (or one whole collection).
#[derive(Debug)]
pub struct ChunkResult {
    pub data_file: DataFile,
    pub outcome: ChunkOutcome,
}

#[derive(Debug)]
pub enum ChunkOutcome {
    /// Statistics of a record chunk.
    Records(CollectorGroup),
    /// Result of a whole-collection checklist evaluation.
    Checklist(ChecklistResult),
    /// The worker could not process its chunk; the error is logged and the
    /// chunk still counts toward job completion.
    Failed(String),
}

impl ChunkResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Failed(_))
    }
}

/// Reads every record of a chunk, runs it through the evaluator and fills a
/// fresh collector group. Any error is caught at this boundary and turned
/// into a `Failed` outcome instead of crashing the coordinator.
pub fn process_chunk(
    chunk: &DataFile,
    evaluator: &dyn RecordEvaluator,
    collectors: &CollectorGroupProvider,
) -> ChunkResult {
    match evaluate_chunk(chunk, evaluator, collectors) {
        Ok(group) => ChunkResult {
            data_file: chunk.clone(),
            outcome: ChunkOutcome::Records(group),
        },
        Err(e) => ChunkResult {
            data_file: chunk.clone(),
            outcome: ChunkOutcome::Failed(e.to_string()),
        },
    }
}

fn evaluate_chunk(
    chunk: &DataFile,
    evaluator: &dyn RecordEvaluator,
    collectors: &CollectorGroupProvider,
) -> Result<CollectorGroup> {
    let mut group = collectors.provide();
    let base = record_line_base(chunk);
    let mut source = open_record_source(chunk)?;
    let mut ordinal = 0u64;
    while let Some(record) = source.read()? {
        ordinal += 1;
        group.accumulate_record(&record);
        if let Some(result) = evaluator.evaluate(Some(base + ordinal), &record) {
            group.accumulate(&result);
        }
    }
    debug!(
        records = ordinal,
        chunk = %chunk.file_path.display(),
        "chunk evaluation finished"
    );
    Ok(group)
}

/// Runs a whole-collection evaluator (checklist) over its target file.
pub fn process_collection(
    prepared: &PreparedDataFile,
    target: &DataFile,
    evaluator: &dyn CollectionEvaluator,
) -> ChunkResult {
    match evaluator.evaluate(prepared, target) {
        Ok(results) => ChunkResult {
            data_file: target.clone(),
            outcome: ChunkOutcome::Checklist(ChecklistResult {
                file_name: target.source_file_name.clone(),
                usage_count: target.num_of_records().unwrap_or(0),
                issues: summarize_issues(&results),
            }),
        },
        Err(e) => ChunkResult {
            data_file: target.clone(),
            outcome: ChunkOutcome::Failed(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::models::{FileFormat, IssueType, RowType};

    use crate::evaluator::EvaluatorFactory;

    #[test]
    fn worker_collects_counts_and_findings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occ.tsv");
        std::fs::write(
            &path,
            "occurrenceID\tscientificName\teventDate\n1\tPuma concolor\t2001\n2\tLynx lynx\t\n",
        )
        .unwrap();

        let mut chunk = DataFile::new("occ.tsv", path, FileFormat::Tabular, b'\t', true);
        chunk.row_type = Some(RowType::Occurrence);
        chunk.columns = vec![
            "occurrenceID".into(),
            "scientificName".into(),
            "eventDate".into(),
        ];

        let factory = EvaluatorFactory::new();
        let evaluator = factory.create_record_evaluator(RowType::Occurrence, &chunk.columns);
        let collectors = CollectorGroupProvider::new(RowType::Occurrence, chunk.columns.clone());

        let result = process_chunk(&chunk, evaluator.as_ref(), &collectors);
        match result.outcome {
            ChunkOutcome::Records(group) => {
                assert_eq!(group.record_count(), 2);
            }
            other => panic!("expected record outcome, got {other:?}"),
        }
    }

    #[test]
    fn worker_failure_is_contained() {
        let mut chunk = DataFile::new(
            "gone.tsv",
            "/nonexistent/gone.tsv",
            FileFormat::Tabular,
            b'\t',
            true,
        );
        chunk.row_type = Some(RowType::Occurrence);

        let factory = EvaluatorFactory::new();
        let evaluator = factory.create_record_evaluator(RowType::Occurrence, &[]);
        let collectors = CollectorGroupProvider::new(RowType::Occurrence, vec![]);

        let result = process_chunk(&chunk, evaluator.as_ref(), &collectors);
        assert!(result.is_failed());
    }

    #[test]
    fn collection_worker_wraps_checklist_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxon.txt");
        std::fs::write(&path, "taxonID\tscientificName\n1\tAves\n2\t\n").unwrap();

        let mut target = DataFile::new("taxon.txt", path, FileFormat::Tabular, b'\t', true);
        target.row_type = Some(RowType::Taxon);
        target.num_of_lines = Some(3);
        target.columns = vec!["taxonID".into(), "scientificName".into()];

        let prepared = PreparedDataFile {
            source: target.clone(),
            core: target.clone(),
            extensions: vec![],
        };
        let evaluator = EvaluatorFactory::new().create_checklist_evaluator();

        let result = process_collection(&prepared, &target, &evaluator);
        match result.outcome {
            ChunkOutcome::Checklist(checklist) => {
                assert_eq!(checklist.usage_count, 2);
                assert!(checklist
                    .issues
                    .iter()
                    .any(|i| i.issue == IssueType::ScientificNameMissing));
            }
            other => panic!("expected checklist outcome, got {other:?}"),
        }
    }
}
