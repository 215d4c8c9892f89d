use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical layout of a submitted data package.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileFormat {
    #[serde(rename = "TABULAR")]
    Tabular,
    #[serde(rename = "ARCHIVE")]
    Archive,
}

/// Kind of record a file (or chunk) holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowType {
    #[serde(rename = "OCCURRENCE")]
    Occurrence,
    #[serde(rename = "TAXON")]
    Taxon,
    #[serde(rename = "EVENT")]
    Event,
    #[serde(untagged)]
    Other(String),
}

impl RowType {
    /// Checklist schemas must be evaluated as a whole collection by a single
    /// worker instead of being split into chunks.
    pub fn requires_collection_evaluation(&self) -> bool {
        matches!(self, RowType::Taxon)
    }

    /// Short name used for split directories and report labels.
    pub fn simple_name(&self) -> &str {
        match self {
            RowType::Occurrence => "Occurrence",
            RowType::Taxon => "Taxon",
            RowType::Event => "Event",
            RowType::Other(name) => name,
        }
    }
}

impl std::fmt::Display for RowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.simple_name())
    }
}

/// Descriptor of one validatable file.
///
/// A `DataFile` starts as the bare submission descriptor; source preparation
/// fills in columns, row type and line count, and the splitter clones it per
/// chunk (`split_child`) without mutating the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub key: Uuid,
    pub source_file_name: String,
    pub file_path: PathBuf,
    pub file_format: FileFormat,
    pub row_type: Option<RowType>,
    /// Field delimiter of delimited content.
    pub delimiter: u8,
    pub has_headers: bool,
    pub num_of_lines: Option<u64>,
    /// Offset of the first data line relative to the original file; set on
    /// split chunks so diagnostics map back to original line numbers.
    pub line_offset: Option<u64>,
    pub columns: Vec<String>,
    /// Whether this file is the core of a multi-file archive.
    pub is_core: bool,
}

impl DataFile {
    pub fn new(
        source_file_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
        file_format: FileFormat,
        delimiter: u8,
        has_headers: bool,
    ) -> Self {
        Self {
            key: Uuid::new_v4(),
            source_file_name: source_file_name.into(),
            file_path: file_path.into(),
            file_format,
            row_type: None,
            delimiter,
            has_headers,
            num_of_lines: None,
            line_offset: None,
            columns: Vec::new(),
            is_core: true,
        }
    }

    /// Number of data records, discounting a header line when present.
    pub fn num_of_records(&self) -> Option<u64> {
        self.num_of_lines
            .map(|lines| lines.saturating_sub(u64::from(self.has_headers)))
    }

    /// New descriptor representing one chunk of this file. Everything but
    /// path, header flag and line accounting is copied verbatim.
    pub fn split_child(
        &self,
        file_path: PathBuf,
        has_headers: bool,
        num_of_lines: u64,
        line_offset: u64,
    ) -> Self {
        Self {
            key: self.key,
            source_file_name: self.source_file_name.clone(),
            file_path,
            file_format: self.file_format,
            row_type: self.row_type.clone(),
            delimiter: self.delimiter,
            has_headers,
            num_of_lines: Some(num_of_lines),
            line_offset: Some(line_offset),
            columns: self.columns.clone(),
            is_core: self.is_core,
        }
    }
}

/// A submitted input after source preparation: the per-schema tabular
/// descriptors with populated headers and line counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDataFile {
    /// The descriptor as submitted.
    pub source: DataFile,
    /// Core schema file (the only file for plain tabular input).
    pub core: DataFile,
    /// Extension schema files of an archive, empty otherwise.
    pub extensions: Vec<DataFile>,
}

impl PreparedDataFile {
    /// All per-schema files, core first.
    pub fn tabular_files(&self) -> impl Iterator<Item = &DataFile> {
        std::iter::once(&self.core).chain(self.extensions.iter())
    }

    pub fn by_row_type(&self, row_type: &RowType) -> Option<&DataFile> {
        self.tabular_files()
            .find(|df| df.row_type.as_ref() == Some(row_type))
    }
}
