use std::path::PathBuf;
use std::sync::Arc;

use validator_core::errors::Result;
use validator_core::models::{DataFile, PreparedDataFile, RowType};
use validator_core::traits::{CollectionEvaluator, MetadataEvaluator, RecordEvaluator};

use crate::collector::CollectorGroupProvider;
use crate::evaluator::EvaluatorFactory;

/// How a collection unit participates in job execution: integrity units run
/// in the pre-dispatch fail-fast pass, checklist units are dispatched as
/// single whole-collection workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionUnitKind {
    Integrity,
    Checklist,
}

/// Plan data for evaluating the chunks of one schema record by record.
pub struct RecordEvaluationUnit {
    data_files: Vec<DataFile>,
    row_type: RowType,
    evaluator: Arc<dyn RecordEvaluator>,
    collectors: CollectorGroupProvider,
}

impl RecordEvaluationUnit {
    pub fn data_files(&self) -> &[DataFile] {
        &self.data_files
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn evaluator(&self) -> Arc<dyn RecordEvaluator> {
        Arc::clone(&self.evaluator)
    }

    pub fn collectors(&self) -> &CollectorGroupProvider {
        &self.collectors
    }
}

/// Plan data for one whole-collection evaluation.
pub struct CollectionEvaluationUnit {
    kind: CollectionUnitKind,
    row_type: RowType,
    target: DataFile,
    evaluator: Arc<dyn CollectionEvaluator>,
}

impl CollectionEvaluationUnit {
    pub fn kind(&self) -> CollectionUnitKind {
        self.kind
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn target(&self) -> &DataFile {
        &self.target
    }

    pub fn evaluator(&self) -> Arc<dyn CollectionEvaluator> {
        Arc::clone(&self.evaluator)
    }
}

struct MetadataEvaluationUnit {
    evaluator: Box<dyn MetadataEvaluator>,
}

/// The per-job, immutable evaluation plan: whole-archive metadata checks,
/// whole-collection checks and per-record checks, built once from a
/// prepared input. The chain holds plan data plus iteration only; executing
/// a unit is the passed runner's business, so the same plan can be dry-run
/// without side effects.
///
/// An `EvaluationChain` is specific to one prepared input and must not be
/// reused across jobs.
pub struct EvaluationChain {
    prepared: PreparedDataFile,
    metadata_units: Vec<MetadataEvaluationUnit>,
    collection_units: Vec<CollectionEvaluationUnit>,
    record_units: Vec<RecordEvaluationUnit>,
}

impl EvaluationChain {
    pub fn builder(
        prepared: PreparedDataFile,
        factory: EvaluatorFactory,
        working_dir: PathBuf,
    ) -> EvaluationChainBuilder {
        EvaluationChainBuilder {
            prepared,
            factory,
            _working_dir: working_dir,
            metadata_units: Vec::new(),
            collection_units: Vec::new(),
            record_units: Vec::new(),
        }
    }

    pub fn prepared(&self) -> &PreparedDataFile {
        &self.prepared
    }

    /// Runs all whole-archive metadata units through `runner`.
    pub fn run_metadata_evaluation<R>(&self, mut runner: R) -> Result<()>
    where
        R: FnMut(&PreparedDataFile, &dyn MetadataEvaluator) -> Result<()>,
    {
        for unit in &self.metadata_units {
            runner(&self.prepared, unit.evaluator.as_ref())?;
        }
        Ok(())
    }

    /// Runs all whole-collection units through `runner`.
    pub fn run_collection_evaluation<R>(&self, mut runner: R) -> Result<()>
    where
        R: FnMut(&PreparedDataFile, &CollectionEvaluationUnit) -> Result<()>,
    {
        for unit in &self.collection_units {
            runner(&self.prepared, unit)?;
        }
        Ok(())
    }

    /// Runs all per-record units through `runner`.
    pub fn run_record_evaluation<R>(&self, mut runner: R) -> Result<()>
    where
        R: FnMut(&RecordEvaluationUnit) -> Result<()>,
    {
        for unit in &self.record_units {
            runner(unit)?;
        }
        Ok(())
    }

    pub fn num_of_metadata_units(&self) -> usize {
        self.metadata_units.len()
    }

    pub fn num_of_collection_units(&self) -> usize {
        self.collection_units.len()
    }

    pub fn num_of_record_units(&self) -> usize {
        self.record_units.len()
    }
}

impl std::fmt::Display for EvaluationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.collection_units.is_empty() {
            writeln!(f, "Collection evaluation units:")?;
            for unit in &self.collection_units {
                writeln!(f, "  {:?} {}", unit.kind, unit.row_type)?;
            }
        }
        if !self.record_units.is_empty() {
            writeln!(f, "Record evaluation units:")?;
            for unit in &self.record_units {
                writeln!(f, "  {} ({} chunks)", unit.row_type, unit.data_files.len())?;
            }
        }
        Ok(())
    }
}

/// Accumulates evaluation units against one prepared input; `build` freezes
/// them into an immutable [`EvaluationChain`].
pub struct EvaluationChainBuilder {
    prepared: PreparedDataFile,
    factory: EvaluatorFactory,
    _working_dir: PathBuf,
    metadata_units: Vec<MetadataEvaluationUnit>,
    collection_units: Vec<CollectionEvaluationUnit>,
    record_units: Vec<RecordEvaluationUnit>,
}

impl EvaluationChainBuilder {
    /// Adds a per-record unit over the (possibly split) chunks of one
    /// schema. All chunks must share the row type.
    pub fn evaluate_records(
        mut self,
        row_type: RowType,
        columns: Vec<String>,
        data_files: Vec<DataFile>,
    ) -> Self {
        let evaluator: Arc<dyn RecordEvaluator> = Arc::from(
            self.factory
                .create_record_evaluator(row_type.clone(), &columns),
        );
        self.record_units.push(RecordEvaluationUnit {
            data_files,
            row_type: row_type.clone(),
            evaluator,
            collectors: CollectorGroupProvider::new(row_type, columns),
        });
        self
    }

    /// Adds the core-record uniqueness check.
    pub fn evaluate_core_uniqueness(mut self) -> Self {
        let row_type = match self.prepared.core.row_type.clone() {
            Some(row_type) => row_type,
            None => return self,
        };
        self.collection_units.push(CollectionEvaluationUnit {
            kind: CollectionUnitKind::Integrity,
            row_type,
            target: self.prepared.core.clone(),
            evaluator: Arc::from(EvaluatorFactory::create_uniqueness_evaluator()),
        });
        self
    }

    /// Adds a referential-integrity check per extension schema. A plain
    /// tabular input has no extensions and gains no unit.
    pub fn evaluate_referential_integrity(mut self) -> Self {
        let units: Vec<CollectionEvaluationUnit> = self
            .prepared
            .extensions
            .iter()
            .filter_map(|extension| {
                let row_type = extension.row_type.clone()?;
                Some(CollectionEvaluationUnit {
                    kind: CollectionUnitKind::Integrity,
                    row_type: row_type.clone(),
                    target: extension.clone(),
                    evaluator: Arc::from(EvaluatorFactory::create_referential_integrity_evaluator(
                        row_type,
                    )),
                })
            })
            .collect();
        self.collection_units.extend(units);
        self
    }

    /// Adds the whole-archive metadata content check.
    pub fn evaluate_metadata_content(mut self) -> Self {
        self.metadata_units.push(MetadataEvaluationUnit {
            evaluator: self.factory.create_metadata_evaluator(),
        });
        self
    }

    /// Adds one checklist unit per taxon schema file, if any.
    pub fn evaluate_checklists(mut self) -> Self {
        let units: Vec<CollectionEvaluationUnit> = self
            .prepared
            .tabular_files()
            .filter(|df| {
                df.row_type
                    .as_ref()
                    .is_some_and(RowType::requires_collection_evaluation)
            })
            .map(|df| CollectionEvaluationUnit {
                kind: CollectionUnitKind::Checklist,
                row_type: RowType::Taxon,
                target: df.clone(),
                evaluator: Arc::new(self.factory.create_checklist_evaluator()),
            })
            .collect();
        self.collection_units.extend(units);
        self
    }

    pub fn build(self) -> EvaluationChain {
        EvaluationChain {
            prepared: self.prepared,
            metadata_units: self.metadata_units,
            collection_units: self.collection_units,
            record_units: self.record_units,
        }
    }
}
