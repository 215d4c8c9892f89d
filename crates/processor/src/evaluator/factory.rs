use validator_core::models::{FileFormat, RowType};
use validator_core::traits::{
    CollectionEvaluator, MetadataEvaluator, RecordEvaluator, ResourceStructureEvaluator,
};

use super::checklist::ChecklistEvaluator;
use super::collection::{ReferentialIntegrityEvaluator, UniquenessEvaluator};
use super::record::{CompletenessEvaluator, RecordEvaluatorChain, RecordStructureEvaluator};
use super::structure::{ArchiveMetadataEvaluator, ArchiveStructureEvaluator, TabularStructureEvaluator};

/// Creates the evaluator instances a job needs, keyed by schema.
#[derive(Debug, Default, Clone)]
pub struct EvaluatorFactory;

impl EvaluatorFactory {
    pub fn new() -> Self {
        Self
    }

    /// Per-record evaluator chain for one schema.
    pub fn create_record_evaluator(
        &self,
        row_type: RowType,
        columns: &[String],
    ) -> Box<dyn RecordEvaluator> {
        Box::new(RecordEvaluatorChain::new(vec![
            Box::new(RecordStructureEvaluator::new(row_type.clone(), columns.len())),
            Box::new(CompletenessEvaluator::new(row_type, columns)),
        ]))
    }

    pub fn create_resource_structure_evaluator(
        file_format: FileFormat,
    ) -> Box<dyn ResourceStructureEvaluator> {
        match file_format {
            FileFormat::Tabular => Box::new(TabularStructureEvaluator),
            FileFormat::Archive => Box::new(ArchiveStructureEvaluator),
        }
    }

    pub fn create_uniqueness_evaluator() -> Box<dyn CollectionEvaluator> {
        Box::new(UniquenessEvaluator)
    }

    pub fn create_referential_integrity_evaluator(row_type: RowType) -> Box<dyn CollectionEvaluator> {
        Box::new(ReferentialIntegrityEvaluator::new(row_type))
    }

    pub fn create_checklist_evaluator(&self) -> ChecklistEvaluator {
        ChecklistEvaluator
    }

    pub fn create_metadata_evaluator(&self) -> Box<dyn MetadataEvaluator> {
        Box::new(ArchiveMetadataEvaluator)
    }
}
