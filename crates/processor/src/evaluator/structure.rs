use std::collections::HashSet;

use validator_core::errors::Result;
use validator_core::models::{DataFile, IssueType, PreparedDataFile, ValidationIssue};
use validator_core::traits::{MetadataEvaluator, ResourceStructureEvaluator};

use crate::source::prepare::{ArchiveManifest, ARCHIVE_MANIFEST};

/// Structure gate for plain delimited files: the path must point at a
/// non-empty readable file.
pub struct TabularStructureEvaluator;

impl ResourceStructureEvaluator for TabularStructureEvaluator {
    fn evaluate(&self, data_file: &DataFile) -> Result<Option<ValidationIssue>> {
        if !data_file.file_path.is_file() {
            return Ok(Some(ValidationIssue::new(
                IssueType::UnreadableDataFile,
                format!("{} is not a readable file", data_file.file_path.display()),
            )));
        }
        let metadata = std::fs::metadata(&data_file.file_path)?;
        if metadata.len() == 0 {
            return Ok(Some(ValidationIssue::new(
                IssueType::UnreadableDataFile,
                format!("{} is empty", data_file.file_path.display()),
            )));
        }
        Ok(None)
    }
}

/// Structure gate for multi-file archives: the path must be a directory
/// holding a parseable manifest whose declared files all exist.
pub struct ArchiveStructureEvaluator;

impl ResourceStructureEvaluator for ArchiveStructureEvaluator {
    fn evaluate(&self, data_file: &DataFile) -> Result<Option<ValidationIssue>> {
        if !data_file.file_path.is_dir() {
            return Ok(Some(ValidationIssue::new(
                IssueType::InvalidArchiveLayout,
                format!("{} is not a directory", data_file.file_path.display()),
            )));
        }
        if !data_file.file_path.join(ARCHIVE_MANIFEST).is_file() {
            return Ok(Some(ValidationIssue::new(
                IssueType::InvalidArchiveLayout,
                format!("archive descriptor {ARCHIVE_MANIFEST} is missing"),
            )));
        }
        let manifest = match ArchiveManifest::read(&data_file.file_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                return Ok(Some(ValidationIssue::new(
                    IssueType::InvalidArchiveLayout,
                    e.to_string(),
                )))
            }
        };

        if !data_file.file_path.join(&manifest.core.file).is_file() {
            return Ok(Some(ValidationIssue::of_row_type(
                IssueType::CoreFileMissing,
                manifest.core.row_type.clone(),
                format!("declared core file {} does not exist", manifest.core.file),
            )));
        }
        for extension in &manifest.extensions {
            if !data_file.file_path.join(&extension.file).is_file() {
                return Ok(Some(ValidationIssue::of_row_type(
                    IssueType::ManifestEntryMissing,
                    extension.row_type.clone(),
                    format!("declared extension file {} does not exist", extension.file),
                )));
            }
        }
        Ok(None)
    }
}

/// Whole-archive content checks run through the evaluation chain once the
/// source is prepared. Findings invalidate the report without aborting
/// record statistics.
pub struct ArchiveMetadataEvaluator;

impl MetadataEvaluator for ArchiveMetadataEvaluator {
    fn evaluate(&self, prepared: &PreparedDataFile) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if prepared.core.num_of_records().unwrap_or(0) == 0 {
            issues.push(ValidationIssue::of_row_type(
                IssueType::CoreFileMissing,
                prepared
                    .core
                    .row_type
                    .clone()
                    .unwrap_or(validator_core::models::RowType::Occurrence),
                "core file declares no records",
            ));
        }

        let mut seen = HashSet::new();
        for file in prepared.tabular_files() {
            if let Some(row_type) = &file.row_type {
                if !seen.insert(row_type.clone()) {
                    issues.push(ValidationIssue::of_row_type(
                        IssueType::InvalidArchiveLayout,
                        row_type.clone(),
                        format!("row type {row_type} is declared by more than one file"),
                    ));
                }
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::models::FileFormat;

    #[test]
    fn tabular_flags_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = DataFile::new(
            "gone.csv",
            dir.path().join("gone.csv"),
            FileFormat::Tabular,
            b',',
            true,
        );
        let issue = TabularStructureEvaluator.evaluate(&missing).unwrap().unwrap();
        assert_eq!(issue.issue, IssueType::UnreadableDataFile);

        let empty_path = dir.path().join("empty.csv");
        std::fs::write(&empty_path, "").unwrap();
        let empty = DataFile::new("empty.csv", empty_path, FileFormat::Tabular, b',', true);
        let issue = TabularStructureEvaluator.evaluate(&empty).unwrap().unwrap();
        assert_eq!(issue.issue, IssueType::UnreadableDataFile);
    }

    #[test]
    fn tabular_accepts_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        let df = DataFile::new("ok.csv", path, FileFormat::Tabular, b',', true);
        assert!(TabularStructureEvaluator.evaluate(&df).unwrap().is_none());
    }

    #[test]
    fn archive_requires_manifest_and_declared_files() {
        let dir = tempfile::tempdir().unwrap();
        let df = DataFile::new("package", dir.path(), FileFormat::Archive, b'\t', true);

        let issue = ArchiveStructureEvaluator.evaluate(&df).unwrap().unwrap();
        assert_eq!(issue.issue, IssueType::InvalidArchiveLayout);

        std::fs::write(
            dir.path().join(ARCHIVE_MANIFEST),
            r#"{"core": {"file": "taxon.txt", "rowType": "TAXON"}}"#,
        )
        .unwrap();
        let issue = ArchiveStructureEvaluator.evaluate(&df).unwrap().unwrap();
        assert_eq!(issue.issue, IssueType::CoreFileMissing);

        std::fs::write(dir.path().join("taxon.txt"), "taxonID\n1\n").unwrap();
        assert!(ArchiveStructureEvaluator.evaluate(&df).unwrap().is_none());
    }
}
