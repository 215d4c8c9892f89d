use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use validator_core::errors::{Result, ValidatorError};
use validator_core::models::{DataFile, FileFormat, PreparedDataFile, RowType};
use validator_core::traits::{RecordSource, SourcePreparer};

use crate::source::reader::TabularFileReader;
use crate::splitter::count_lines;

/// Name of the descriptor file at the root of a multi-file archive.
pub const ARCHIVE_MANIFEST: &str = "manifest.json";

/// Archive descriptor: names the core file and the extension files.
#[derive(Debug, Deserialize)]
pub struct ArchiveManifest {
    pub core: ManifestEntry,
    #[serde(default)]
    pub extensions: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(rename = "rowType")]
    pub row_type: RowType,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_has_headers", rename = "hasHeaders")]
    pub has_headers: bool,
}

fn default_delimiter() -> char {
    '\t'
}

fn default_has_headers() -> bool {
    true
}

impl ArchiveManifest {
    pub fn read(archive_dir: &Path) -> Result<Self> {
        let path = archive_dir.join(ARCHIVE_MANIFEST);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ValidatorError::SourcePreparation(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ValidatorError::SourcePreparation(format!("invalid archive manifest: {e}"))
        })
    }
}

/// Default format-dispatching preparation: populates headers, row types and
/// line counts, and explodes an archive into its per-schema descriptors.
pub struct DefaultSourcePreparer;

impl DefaultSourcePreparer {
    fn prepare_tabular(&self, data_file: &DataFile) -> Result<DataFile> {
        let mut prepared = data_file.clone();
        prepared.num_of_lines = Some(count_lines(&prepared.file_path)?);
        prepared.columns = read_columns(&prepared)?;
        if prepared.row_type.is_none() {
            prepared.row_type = Some(RowType::Occurrence);
        }
        prepared.is_core = true;
        Ok(prepared)
    }

    fn prepare_archive_entry(
        &self,
        source: &DataFile,
        archive_dir: &Path,
        entry: &ManifestEntry,
        is_core: bool,
    ) -> Result<DataFile> {
        let mut component = DataFile::new(
            entry.file.clone(),
            archive_dir.join(&entry.file),
            FileFormat::Tabular,
            entry.delimiter as u8,
            entry.has_headers,
        );
        component.key = source.key;
        component.row_type = Some(entry.row_type.clone());
        component.is_core = is_core;
        component.num_of_lines = Some(count_lines(&component.file_path)?);
        component.columns = read_columns(&component)?;
        Ok(component)
    }
}

impl SourcePreparer for DefaultSourcePreparer {
    fn prepare(&self, data_file: &DataFile, _working_dir: &Path) -> Result<PreparedDataFile> {
        match data_file.file_format {
            FileFormat::Tabular => {
                let core = self.prepare_tabular(data_file)?;
                debug!(
                    lines = core.num_of_lines,
                    columns = core.columns.len(),
                    "prepared tabular source {}", core.source_file_name
                );
                Ok(PreparedDataFile {
                    source: data_file.clone(),
                    core,
                    extensions: Vec::new(),
                })
            }
            FileFormat::Archive => {
                let archive_dir = data_file.file_path.clone();
                let manifest = ArchiveManifest::read(&archive_dir)?;
                let core =
                    self.prepare_archive_entry(data_file, &archive_dir, &manifest.core, true)?;
                let extensions = manifest
                    .extensions
                    .iter()
                    .map(|entry| self.prepare_archive_entry(data_file, &archive_dir, entry, false))
                    .collect::<Result<Vec<_>>>()?;
                debug!(
                    extensions = extensions.len(),
                    "prepared archive source {}", data_file.source_file_name
                );
                Ok(PreparedDataFile {
                    source: data_file.clone(),
                    core,
                    extensions,
                })
            }
        }
    }
}

/// Column names of a tabular file: its headers when declared, otherwise
/// positional names derived from the first record's width.
fn read_columns(data_file: &DataFile) -> Result<Vec<String>> {
    let mut reader = TabularFileReader::open(
        &data_file.file_path,
        data_file.delimiter,
        data_file.has_headers,
    )?;
    if let Some(headers) = reader.headers() {
        return Ok(headers.to_vec());
    }
    let width = reader.read()?.map(|record| record.len()).unwrap_or(0);
    Ok((0..width).map(|i| format!("column_{i}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepares_tabular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occ.tsv");
        std::fs::write(&path, "occurrenceID\tscientificName\n1\tPuma concolor\n").unwrap();

        let df = DataFile::new("occ.tsv", path, FileFormat::Tabular, b'\t', true);
        let prepared = DefaultSourcePreparer
            .prepare(&df, dir.path())
            .unwrap();

        assert_eq!(prepared.core.num_of_lines, Some(2));
        assert_eq!(prepared.core.row_type, Some(RowType::Occurrence));
        assert_eq!(
            prepared.core.columns,
            vec!["occurrenceID".to_string(), "scientificName".to_string()]
        );
        assert!(prepared.extensions.is_empty());
    }

    #[test]
    fn prepares_archive_with_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(ARCHIVE_MANIFEST),
            r#"{
                "core": {"file": "taxon.txt", "rowType": "TAXON"},
                "extensions": [
                    {"file": "distribution.txt", "rowType": "Distribution", "delimiter": ",", "hasHeaders": false}
                ]
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("taxon.txt"), "taxonID\tscientificName\n1\tAves\n").unwrap();
        std::fs::write(dir.path().join("distribution.txt"), "1,DK\n2,SE\n").unwrap();

        let df = DataFile::new("package", dir.path(), FileFormat::Archive, b'\t', true);
        let prepared = DefaultSourcePreparer.prepare(&df, dir.path()).unwrap();

        assert_eq!(prepared.core.row_type, Some(RowType::Taxon));
        assert!(prepared.core.is_core);
        assert_eq!(prepared.extensions.len(), 1);
        let ext = &prepared.extensions[0];
        assert_eq!(ext.row_type, Some(RowType::Other("Distribution".into())));
        assert_eq!(ext.delimiter, b',');
        assert!(!ext.has_headers);
        assert_eq!(ext.columns, vec!["column_0".to_string(), "column_1".to_string()]);
        assert_eq!(ext.num_of_lines, Some(2));
    }

    #[test]
    fn missing_manifest_is_a_preparation_error() {
        let dir = tempfile::tempdir().unwrap();
        let df = DataFile::new("package", dir.path(), FileFormat::Archive, b'\t', true);
        assert!(DefaultSourcePreparer.prepare(&df, dir.path()).is_err());
    }
}
