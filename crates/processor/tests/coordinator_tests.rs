use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use validator_core::config::ValidatorConfig;
use validator_core::models::{DataFile, DataJob, FileFormat, IssueType, RowType};
use validator_processor::{
    DefaultSourcePreparer, EvaluatorFactory, ParallelProcessingCoordinator, ARCHIVE_MANIFEST,
};

fn coordinator(working_dir: &Path, split_size: u64, preserve: bool) -> ParallelProcessingCoordinator {
    let config = ValidatorConfig {
        working_dir: working_dir.to_path_buf(),
        file_split_size: split_size,
        preserve_temporary_files: preserve,
        ..ValidatorConfig::default()
    };
    ParallelProcessingCoordinator::new(
        EvaluatorFactory::new(),
        Arc::new(DefaultSourcePreparer),
        &config,
    )
}

fn job(data_file: DataFile) -> DataJob {
    DataJob::new(1, chrono::Utc::now(), data_file)
}

fn occurrence_lines(records: u64) -> String {
    let mut content = String::from("occurrenceID\tscientificName\teventDate\n");
    for i in 0..records {
        content.push_str(&format!("id-{i}\tPuma concolor\t2001-0{}-01\n", (i % 9) + 1));
    }
    content
}

#[tokio::test]
async fn hundred_line_file_is_split_into_three_chunks_and_merged() {
    let input_dir = tempfile::tempdir().unwrap();
    let working_dir = tempfile::tempdir().unwrap();
    // header + 100 records
    let path = input_dir.path().join("occurrences.tsv");
    std::fs::write(&path, occurrence_lines(100)).unwrap();

    let data_file = DataFile::new("occurrences.tsv", path, FileFormat::Tabular, b'\t', true);
    let coordinator = coordinator(working_dir.path(), 40, true);
    let (_kill_tx, kill_rx) = watch::channel(false);

    let report = coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap()
        .expect("job should finish, not be killed");

    assert!(report.valid);
    assert_eq!(report.schema_reports.len(), 1);
    let section = &report.schema_reports[0];
    assert_eq!(section.row_type, RowType::Occurrence);
    assert_eq!(section.record_count, 100);
    assert_eq!(section.term_frequency["occurrenceID"], 100);
    assert_eq!(section.failed_chunks, 0);

    // with preserved temporary files the three dispatched chunks are visible
    let job_dirs: Vec<_> = std::fs::read_dir(working_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(job_dirs.len(), 1);
    let split_dir = job_dirs[0].join("Occurrence_split");
    assert_eq!(std::fs::read_dir(&split_dir).unwrap().count(), 3);
}

#[tokio::test]
async fn structurally_invalid_input_short_circuits_without_chunks() {
    let working_dir = tempfile::tempdir().unwrap();
    let data_file = DataFile::new(
        "missing.tsv",
        "/nonexistent/missing.tsv",
        FileFormat::Tabular,
        b'\t',
        true,
    );
    let coordinator = coordinator(working_dir.path(), 40, true);
    let (_kill_tx, kill_rx) = watch::channel(false);

    let report = coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap()
        .unwrap();

    assert!(!report.valid);
    assert_eq!(report.resource_issues.len(), 1);
    assert_eq!(report.resource_issues[0].issue, IssueType::UnreadableDataFile);
    assert!(report.schema_reports.is_empty());

    // the job's working directory never saw a split
    let job_dirs: Vec<_> = std::fs::read_dir(working_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(job_dirs.len(), 1);
    assert_eq!(std::fs::read_dir(&job_dirs[0]).unwrap().count(), 0);
}

#[tokio::test]
async fn working_dir_is_removed_on_completion() {
    let input_dir = tempfile::tempdir().unwrap();
    let working_dir = tempfile::tempdir().unwrap();
    let path = input_dir.path().join("occurrences.tsv");
    std::fs::write(&path, occurrence_lines(5)).unwrap();

    let data_file = DataFile::new("occurrences.tsv", path, FileFormat::Tabular, b'\t', true);
    let coordinator = coordinator(working_dir.path(), 40, false);
    let (_kill_tx, kill_rx) = watch::channel(false);

    coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(std::fs::read_dir(working_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn kill_signal_aborts_the_job() {
    let input_dir = tempfile::tempdir().unwrap();
    let working_dir = tempfile::tempdir().unwrap();
    let path = input_dir.path().join("occurrences.tsv");
    std::fs::write(&path, occurrence_lines(50)).unwrap();

    let data_file = DataFile::new("occurrences.tsv", path, FileFormat::Tabular, b'\t', true);
    let coordinator = coordinator(working_dir.path(), 10, false);
    let (kill_tx, kill_rx) = watch::channel(false);
    kill_tx.send(true).unwrap();

    let outcome = coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap();

    assert!(outcome.is_none());
    // the working directory is removed on the kill path too
    assert_eq!(std::fs::read_dir(working_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn archive_with_taxon_extension_runs_checklist_worker() {
    let archive_dir = tempfile::tempdir().unwrap();
    let working_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        archive_dir.path().join(ARCHIVE_MANIFEST),
        r#"{
            "core": {"file": "occurrence.txt", "rowType": "OCCURRENCE"},
            "extensions": [{"file": "taxon.txt", "rowType": "TAXON"}]
        }"#,
    )
    .unwrap();
    std::fs::write(
        archive_dir.path().join("occurrence.txt"),
        "occurrenceID\tscientificName\teventDate\n1\tPuma concolor\t2001\n2\tLynx lynx\t2002\n",
    )
    .unwrap();
    std::fs::write(
        archive_dir.path().join("taxon.txt"),
        "coreid\ttaxonID\tscientificName\n1\tt-1\tPuma concolor\n2\tt-2\t\n",
    )
    .unwrap();

    let data_file = DataFile::new(
        "package.zip",
        archive_dir.path(),
        FileFormat::Archive,
        b'\t',
        true,
    );
    let coordinator = coordinator(working_dir.path(), 40, false);
    let (_kill_tx, kill_rx) = watch::channel(false);

    let report = coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap()
        .unwrap();

    assert!(report.valid);
    assert_eq!(report.schema_reports.len(), 1);
    assert_eq!(report.schema_reports[0].row_type, RowType::Occurrence);
    assert_eq!(report.checklist_results.len(), 1);
    assert!(report.checklist_results[0]
        .issues
        .iter()
        .any(|i| i.issue == IssueType::ScientificNameMissing));
}

#[tokio::test]
async fn referential_integrity_violation_short_circuits_archive() {
    let archive_dir = tempfile::tempdir().unwrap();
    let working_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        archive_dir.path().join(ARCHIVE_MANIFEST),
        r#"{
            "core": {"file": "occurrence.txt", "rowType": "OCCURRENCE"},
            "extensions": [{"file": "media.txt", "rowType": "Multimedia"}]
        }"#,
    )
    .unwrap();
    std::fs::write(
        archive_dir.path().join("occurrence.txt"),
        "occurrenceID\tscientificName\n1\tPuma concolor\n",
    )
    .unwrap();
    std::fs::write(
        archive_dir.path().join("media.txt"),
        "coreid\turl\n1\thttp://a\n99\thttp://orphan\n",
    )
    .unwrap();

    let data_file = DataFile::new(
        "package.zip",
        archive_dir.path(),
        FileFormat::Archive,
        b'\t',
        true,
    );
    let coordinator = coordinator(working_dir.path(), 40, false);
    let (_kill_tx, kill_rx) = watch::channel(false);

    let report = coordinator
        .process_data_file(&job(data_file), kill_rx)
        .await
        .unwrap()
        .unwrap();

    assert!(!report.valid);
    assert!(report
        .resource_issues
        .iter()
        .any(|issue| issue.issue == IssueType::RecordReferentialIntegrityViolation));
    // zero workers started: no schema statistics were collected
    assert!(report.schema_reports.is_empty());
    assert!(report.checklist_results.is_empty());
}
