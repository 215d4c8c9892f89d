use std::collections::{HashMap, HashSet};

use validator_core::errors::{Result, ValidatorError};
use validator_core::models::{
    DataFile, IssueDetail, IssueType, PreparedDataFile, RecordEvaluationResult, RowType,
};
use validator_core::traits::CollectionEvaluator;

use crate::source::reader::{open_record_source, record_line_base};

/// Known record-identifier column names, checked case-insensitively. The
/// first column is the fallback, matching archive conventions where the
/// core reference is the leading field.
const IDENTIFIER_COLUMNS: &[&str] = &["id", "coreid", "occurrenceid", "taxonid", "eventid"];

fn identifier_column(data_file: &DataFile) -> usize {
    data_file
        .columns
        .iter()
        .position(|column| {
            IDENTIFIER_COLUMNS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(column))
        })
        .unwrap_or(0)
}

fn read_identifier_values(data_file: &DataFile) -> Result<Vec<(u64, String)>> {
    let column = identifier_column(data_file);
    let base = record_line_base(data_file);
    let mut source = open_record_source(data_file)?;
    let mut values = Vec::new();
    let mut ordinal = 0u64;
    while let Some(record) = source.read()? {
        ordinal += 1;
        let value = record.get(column).cloned().unwrap_or_default();
        values.push((base + ordinal, value));
    }
    Ok(values)
}

/// Whole-collection check that every core record is uniquely identified.
pub struct UniquenessEvaluator;

impl CollectionEvaluator for UniquenessEvaluator {
    fn evaluate(
        &self,
        _prepared: &PreparedDataFile,
        target: &DataFile,
    ) -> Result<Vec<RecordEvaluationResult>> {
        let row_type = required_row_type(target)?;
        let mut first_seen: HashMap<String, u64> = HashMap::new();
        let mut results = Vec::new();
        for (line, value) in read_identifier_values(target)? {
            if value.trim().is_empty() {
                continue;
            }
            if first_seen.contains_key(&value) {
                if let Some(result) = RecordEvaluationResult::builder(row_type.clone(), Some(line))
                    .add_detail(
                        IssueDetail::new(IssueType::RecordNotUniquelyIdentified)
                            .with_related_data("identifier", value.clone()),
                    )
                    .build()
                {
                    results.push(result);
                }
            } else {
                first_seen.insert(value, line);
            }
        }
        Ok(results)
    }
}

/// Whole-collection check that every extension record references an
/// existing core record.
pub struct ReferentialIntegrityEvaluator {
    row_type: RowType,
}

impl ReferentialIntegrityEvaluator {
    pub fn new(row_type: RowType) -> Self {
        Self { row_type }
    }
}

impl CollectionEvaluator for ReferentialIntegrityEvaluator {
    fn evaluate(
        &self,
        prepared: &PreparedDataFile,
        target: &DataFile,
    ) -> Result<Vec<RecordEvaluationResult>> {
        let core_ids: HashSet<String> = read_identifier_values(&prepared.core)?
            .into_iter()
            .map(|(_, value)| value)
            .filter(|value| !value.trim().is_empty())
            .collect();

        let mut results = Vec::new();
        for (line, value) in read_identifier_values(target)? {
            if value.trim().is_empty() || core_ids.contains(&value) {
                continue;
            }
            if let Some(result) = RecordEvaluationResult::builder(self.row_type.clone(), Some(line))
                .add_detail(
                    IssueDetail::new(IssueType::RecordReferentialIntegrityViolation)
                        .with_related_data("coreReference", value.clone()),
                )
                .build()
            {
                results.push(result);
            }
        }
        Ok(results)
    }
}

fn required_row_type(data_file: &DataFile) -> Result<RowType> {
    data_file.row_type.clone().ok_or_else(|| {
        ValidatorError::InvalidDataFile("DataFile rowType shall be provided".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::models::FileFormat;

    fn tabular_file(dir: &std::path::Path, name: &str, content: &str, row_type: RowType) -> DataFile {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let mut df = DataFile::new(name, path, FileFormat::Tabular, b'\t', true);
        df.row_type = Some(row_type);
        df.columns = content
            .lines()
            .next()
            .unwrap()
            .split('\t')
            .map(str::to_string)
            .collect();
        df
    }

    fn prepared(core: DataFile, extensions: Vec<DataFile>) -> PreparedDataFile {
        PreparedDataFile {
            source: core.clone(),
            core,
            extensions,
        }
    }

    #[test]
    fn uniqueness_flags_duplicate_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let core = tabular_file(
            dir.path(),
            "occ.tsv",
            "occurrenceID\tscientificName\n1\tA\n2\tB\n1\tC\n",
            RowType::Occurrence,
        );
        let input = prepared(core.clone(), vec![]);

        let results = UniquenessEvaluator.evaluate(&input, &core).unwrap();
        assert_eq!(results.len(), 1);
        // duplicate sits on the fourth line of the original file
        assert_eq!(results[0].line_number, Some(4));
        assert_eq!(
            results[0].details[0].issue,
            IssueType::RecordNotUniquelyIdentified
        );
    }

    #[test]
    fn referential_integrity_flags_orphan_references() {
        let dir = tempfile::tempdir().unwrap();
        let core = tabular_file(
            dir.path(),
            "occ.tsv",
            "occurrenceID\tscientificName\n1\tA\n2\tB\n",
            RowType::Occurrence,
        );
        let extension = tabular_file(
            dir.path(),
            "media.tsv",
            "coreid\turl\n1\thttp://a\n3\thttp://b\n",
            RowType::Other("Multimedia".into()),
        );
        let input = prepared(core, vec![extension.clone()]);

        let results = ReferentialIntegrityEvaluator::new(extension.row_type.clone().unwrap())
            .evaluate(&input, &extension)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line_number, Some(3));
        assert_eq!(
            results[0].details[0].related_data["coreReference"],
            "3".to_string()
        );
    }

    #[test]
    fn clean_collections_produce_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let core = tabular_file(
            dir.path(),
            "occ.tsv",
            "occurrenceID\tscientificName\n1\tA\n2\tB\n",
            RowType::Occurrence,
        );
        let input = prepared(core.clone(), vec![]);
        assert!(UniquenessEvaluator.evaluate(&input, &core).unwrap().is_empty());
    }
}
