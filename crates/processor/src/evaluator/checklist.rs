use std::collections::{HashMap, HashSet};

use tracing::debug;
use validator_core::errors::Result;
use validator_core::models::{
    ChecklistResult, DataFile, IssueDetail, IssueType, PreparedDataFile, RecordEvaluationResult,
    RowType,
};
use validator_core::traits::CollectionEvaluator;

use crate::collector::summarize_issues;
use crate::source::reader::{open_record_source, record_line_base};

/// Whole-collection evaluation of a taxon file: name usages are inspected
/// together so identifiers, names and parent references can be checked
/// across the entire checklist.
pub struct ChecklistEvaluator;

struct Usage {
    line: u64,
    taxon_id: String,
    scientific_name: String,
    parent_id: String,
}

impl ChecklistEvaluator {
    fn column(columns: &[String], name: &str) -> Option<usize> {
        columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    fn read_usages(target: &DataFile) -> Result<Vec<Usage>> {
        let taxon_id_idx = Self::column(&target.columns, "taxonID").unwrap_or(0);
        let name_idx = Self::column(&target.columns, "scientificName");
        let parent_idx = Self::column(&target.columns, "parentNameUsageID");

        let base = record_line_base(target);
        let mut source = open_record_source(target)?;
        let mut usages = Vec::new();
        let mut ordinal = 0u64;
        while let Some(record) = source.read()? {
            ordinal += 1;
            let field = |idx: Option<usize>| {
                idx.and_then(|idx| record.get(idx)).cloned().unwrap_or_default()
            };
            usages.push(Usage {
                line: base + ordinal,
                taxon_id: field(Some(taxon_id_idx)),
                scientific_name: field(name_idx),
                parent_id: field(parent_idx),
            });
        }
        Ok(usages)
    }

    /// Convenience wrapper producing the aggregated per-file result.
    pub fn evaluate_to_result(
        &self,
        prepared: &PreparedDataFile,
        target: &DataFile,
    ) -> Result<ChecklistResult> {
        let results = self.evaluate(prepared, target)?;
        Ok(ChecklistResult {
            file_name: target.source_file_name.clone(),
            usage_count: target.num_of_records().unwrap_or(0),
            issues: summarize_issues(&results),
        })
    }
}

impl CollectionEvaluator for ChecklistEvaluator {
    fn evaluate(
        &self,
        _prepared: &PreparedDataFile,
        target: &DataFile,
    ) -> Result<Vec<RecordEvaluationResult>> {
        let usages = Self::read_usages(target)?;
        let known_ids: HashSet<&str> = usages
            .iter()
            .map(|usage| usage.taxon_id.as_str())
            .filter(|id| !id.trim().is_empty())
            .collect();
        let mut seen: HashMap<&str, u64> = HashMap::new();

        let mut results = Vec::new();
        for usage in &usages {
            let mut builder =
                RecordEvaluationResult::builder(RowType::Taxon, Some(usage.line));

            if !usage.taxon_id.trim().is_empty() {
                if seen.contains_key(usage.taxon_id.as_str()) {
                    builder = builder.add_detail(
                        IssueDetail::new(IssueType::DuplicatedTaxonId)
                            .with_related_data("taxonID", usage.taxon_id.clone()),
                    );
                } else {
                    seen.insert(usage.taxon_id.as_str(), usage.line);
                }
            }

            if usage.scientific_name.trim().is_empty() {
                builder = builder.add_issue(IssueType::ScientificNameMissing);
            }

            if !usage.parent_id.trim().is_empty() && !known_ids.contains(usage.parent_id.as_str()) {
                builder = builder.add_detail(
                    IssueDetail::new(IssueType::ParentNameUsageIdUnresolved)
                        .with_related_data("parentNameUsageID", usage.parent_id.clone()),
                );
            }

            if let Some(result) = builder.build() {
                results.push(result);
            }
        }
        debug!(
            usages = usages.len(),
            findings = results.len(),
            "checklist evaluation of {}", target.source_file_name
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_core::models::FileFormat;

    fn taxon_file(dir: &std::path::Path, content: &str) -> DataFile {
        let path = dir.join("taxon.txt");
        std::fs::write(&path, content).unwrap();
        let mut df = DataFile::new("taxon.txt", path, FileFormat::Tabular, b'\t', true);
        df.row_type = Some(RowType::Taxon);
        df.num_of_lines = Some(content.lines().count() as u64);
        df.columns = content
            .lines()
            .next()
            .unwrap()
            .split('\t')
            .map(str::to_string)
            .collect();
        df
    }

    fn prepared(core: DataFile) -> PreparedDataFile {
        PreparedDataFile {
            source: core.clone(),
            core,
            extensions: vec![],
        }
    }

    #[test]
    fn finds_duplicates_missing_names_and_dangling_parents() {
        let dir = tempfile::tempdir().unwrap();
        let core = taxon_file(
            dir.path(),
            "taxonID\tscientificName\tparentNameUsageID\n\
             1\tAves\t\n\
             2\t\t1\n\
             1\tFalco\t9\n",
        );
        let input = prepared(core.clone());

        let results = ChecklistEvaluator.evaluate(&input, &core).unwrap();
        let all_issues: Vec<IssueType> = results
            .iter()
            .flat_map(|r| r.details.iter().map(|d| d.issue))
            .collect();

        assert!(all_issues.contains(&IssueType::DuplicatedTaxonId));
        assert!(all_issues.contains(&IssueType::ScientificNameMissing));
        assert!(all_issues.contains(&IssueType::ParentNameUsageIdUnresolved));
    }

    #[test]
    fn aggregated_result_carries_usage_count() {
        let dir = tempfile::tempdir().unwrap();
        let core = taxon_file(
            dir.path(),
            "taxonID\tscientificName\tparentNameUsageID\n1\tAves\t\n2\tFalco\t1\n",
        );
        let input = prepared(core.clone());

        let result = ChecklistEvaluator.evaluate_to_result(&input, &core).unwrap();
        assert_eq!(result.usage_count, 2);
        assert!(result.issues.is_empty());
    }
}
