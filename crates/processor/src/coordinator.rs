use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator_core::config::ValidatorConfig;
use validator_core::errors::{Result, ValidatorError};
use validator_core::models::{
    ChecklistResult, DataFile, DataJob, FileFormat, PreparedDataFile, RowType, SchemaReport,
    ValidationIssue, ValidationReport,
};
use validator_core::traits::SourcePreparer;

use crate::chain::{CollectionUnitKind, EvaluationChain};
use crate::collector::{summarize_issues, CollectorGroup};
use crate::evaluator::EvaluatorFactory;
use crate::splitter::DataFileSplitter;
use crate::worker::{process_chunk, process_collection, ChunkOutcome, ChunkResult};

/// Single-writer aggregation state of one job: merges chunk results as they
/// arrive, in any order, and knows when the last expected result is in.
pub struct JobAggregator {
    expected_workers: usize,
    completed_workers: usize,
    collectors_by_schema: HashMap<RowType, CollectorGroup>,
    checklist_results: Vec<ChecklistResult>,
}

impl JobAggregator {
    pub fn new(expected_workers: usize) -> Self {
        Self {
            expected_workers,
            completed_workers: 0,
            collectors_by_schema: HashMap::new(),
            checklist_results: Vec::new(),
        }
    }

    pub fn expected_workers(&self) -> usize {
        self.expected_workers
    }

    pub fn completed_workers(&self) -> usize {
        self.completed_workers
    }

    pub fn is_complete(&self) -> bool {
        self.completed_workers >= self.expected_workers
    }

    /// Folds one chunk result in and reports whether the job is complete.
    /// A failed chunk counts toward completion; its gap is surfaced in the
    /// schema's report section.
    pub fn apply(&mut self, result: ChunkResult) -> bool {
        match result.outcome {
            ChunkOutcome::Records(group) => {
                let row_type = group.row_type().clone();
                match self.collectors_by_schema.entry(row_type) {
                    std::collections::hash_map::Entry::Occupied(mut entry) => {
                        entry.get_mut().merge_with(group);
                    }
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(group);
                    }
                }
            }
            ChunkOutcome::Checklist(checklist) => {
                self.checklist_results.push(checklist);
            }
            ChunkOutcome::Failed(message) => {
                error!(
                    chunk = %result.data_file.file_path.display(),
                    "chunk processing FAILED: {message}"
                );
                if let Some(row_type) = result.data_file.row_type.clone() {
                    self.collectors_by_schema
                        .entry(row_type.clone())
                        .or_insert_with(|| {
                            CollectorGroup::new(row_type, result.data_file.columns.clone())
                        })
                        .record_failed_chunk();
                }
            }
        }
        self.completed_workers += 1;
        debug!(
            "got {} of {} worker response(s)",
            self.completed_workers, self.expected_workers
        );
        self.is_complete()
    }

    /// Builds the final report from the merged state. One section per
    /// schema, derived from its representative schema-level descriptor.
    pub fn into_report(
        self,
        prepared: &PreparedDataFile,
        resource_issues: Vec<ValidationIssue>,
    ) -> ValidationReport {
        let mut schema_files: HashMap<RowType, DataFile> = prepared
            .tabular_files()
            .filter_map(|df| df.row_type.clone().map(|rt| (rt, df.clone())))
            .collect();

        let mut schema_reports: Vec<SchemaReport> = self
            .collectors_by_schema
            .into_iter()
            .map(|(row_type, group)| {
                let representative = schema_files
                    .remove(&row_type)
                    .unwrap_or_else(|| prepared.core.clone());
                group.into_schema_report(&representative)
            })
            .collect();
        schema_reports.sort_by(|a, b| a.row_type.cmp(&b.row_type));

        ValidationReport {
            valid: resource_issues.is_empty(),
            source_file_name: prepared.source.source_file_name.clone(),
            file_format: prepared.source.file_format,
            resource_issues,
            schema_reports,
            checklist_results: self.checklist_results,
        }
    }
}

/// Central coordinator of one job's parallel processing: decides whether
/// the input must be split, dispatches chunks to a worker pool per
/// evaluation unit and merges the results into the final report.
pub struct ParallelProcessingCoordinator {
    factory: EvaluatorFactory,
    preparer: Arc<dyn SourcePreparer>,
    file_split_size: u64,
    base_working_dir: PathBuf,
    preserve_temporary_files: bool,
}

impl ParallelProcessingCoordinator {
    pub fn new(
        factory: EvaluatorFactory,
        preparer: Arc<dyn SourcePreparer>,
        config: &ValidatorConfig,
    ) -> Self {
        Self {
            factory,
            preparer,
            file_split_size: config.file_split_size,
            base_working_dir: config.working_dir.clone(),
            preserve_temporary_files: config.preserve_temporary_files,
        }
    }

    /// Executes one job to completion.
    ///
    /// Returns `Ok(Some(report))` for a finished validation (valid or not),
    /// `Ok(None)` when the kill signal aborted the job, and `Err` for a
    /// fatal fault that prevented producing any result. The job's working
    /// directory is removed on every path unless configured otherwise.
    pub async fn process_data_file(
        &self,
        job: &DataJob,
        kill_rx: watch::Receiver<bool>,
    ) -> Result<Option<ValidationReport>> {
        let working_dir = self.base_working_dir.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&working_dir).await?;

        let outcome = self.run(job, &working_dir, kill_rx).await;
        self.delete_working_dir(&working_dir);
        outcome
    }

    async fn run(
        &self,
        job: &DataJob,
        working_dir: &Path,
        mut kill_rx: watch::Receiver<bool>,
    ) -> Result<Option<ValidationReport>> {
        let data_file = &job.data_file;

        // structural gate: no chunking, no workers on failure
        let structure_evaluator =
            EvaluatorFactory::create_resource_structure_evaluator(data_file.file_format);
        if let Some(issue) = structure_evaluator.evaluate(data_file)? {
            info!(
                job_id = job.job_id,
                "resource structure issue, stopping before dispatch: {}", issue.message
            );
            return Ok(Some(ValidationReport::of_issues(
                data_file.source_file_name.clone(),
                data_file.file_format,
                vec![issue],
            )));
        }

        // format-specific source preparation
        let prepared = {
            let preparer = Arc::clone(&self.preparer);
            let df = data_file.clone();
            let dir = working_dir.to_path_buf();
            tokio::task::spawn_blocking(move || preparer.prepare(&df, &dir))
                .await
                .map_err(|e| ValidatorError::Internal(format!("preparation task died: {e}")))??
        };

        if killed(&kill_rx) {
            return Ok(None);
        }

        // bulk blocking step: split every per-record schema into chunks
        let record_inputs = {
            let split_size = self.file_split_size;
            let dir = working_dir.to_path_buf();
            let prepared = prepared.clone();
            tokio::task::spawn_blocking(move || split_record_schemas(&prepared, split_size, &dir))
                .await
                .map_err(|e| ValidatorError::Internal(format!("split task died: {e}")))??
        };

        // freeze the evaluation plan
        let mut builder = EvaluationChain::builder(
            prepared.clone(),
            self.factory.clone(),
            working_dir.to_path_buf(),
        );
        if data_file.file_format == FileFormat::Archive {
            builder = builder.evaluate_metadata_content();
        }
        builder = builder
            .evaluate_core_uniqueness()
            .evaluate_referential_integrity()
            .evaluate_checklists();
        for (row_type, columns, chunks) in record_inputs {
            builder = builder.evaluate_records(row_type, columns, chunks);
        }
        let chain = builder.build();
        debug!(job_id = job.job_id, "evaluation plan:\n{chain}");

        // whole-archive metadata content; findings invalidate the report
        // without stopping record statistics
        let mut resource_issues: Vec<ValidationIssue> = Vec::new();
        chain.run_metadata_evaluation(|prepared, evaluator| {
            resource_issues.extend(evaluator.evaluate(prepared)?);
            Ok(())
        })?;

        // pre-dispatch integrity pass; any finding short-circuits, which is
        // guaranteed to happen before any worker is dispatched
        let mut integrity_issues: Vec<ValidationIssue> = Vec::new();
        chain.run_collection_evaluation(|prepared, unit| {
            if unit.kind() != CollectionUnitKind::Integrity {
                return Ok(());
            }
            let results = unit.evaluator().evaluate(prepared, unit.target())?;
            for summary in summarize_issues(&results) {
                let first_line = summary
                    .samples
                    .first()
                    .and_then(|sample| sample.line_number);
                integrity_issues.push(ValidationIssue::of_row_type(
                    summary.issue,
                    unit.row_type().clone(),
                    match first_line {
                        Some(line) => {
                            format!("{} record(s) affected, first at line {line}", summary.count)
                        }
                        None => format!("{} record(s) affected", summary.count),
                    },
                ));
            }
            Ok(())
        })?;
        if !integrity_issues.is_empty() {
            info!(
                job_id = job.job_id,
                issues = integrity_issues.len(),
                "integrity violations, stopping before dispatch"
            );
            resource_issues.extend(integrity_issues);
            return Ok(Some(ValidationReport::of_issues(
                data_file.source_file_name.clone(),
                data_file.file_format,
                resource_issues,
            )));
        }

        if killed(&kill_rx) {
            return Ok(None);
        }

        // dispatch one worker pool per evaluation unit
        let mut expected_workers = 0usize;
        chain.run_record_evaluation(|unit| {
            expected_workers += unit.data_files().len();
            Ok(())
        })?;
        chain.run_collection_evaluation(|_, unit| {
            if unit.kind() == CollectionUnitKind::Checklist {
                expected_workers += 1;
            }
            Ok(())
        })?;
        info!(job_id = job.job_id, "number of workers required: {expected_workers}");

        let (tx, mut rx) = mpsc::channel::<ChunkResult>(expected_workers.max(1));
        self.dispatch_workers(&chain, &prepared, &tx)?;
        drop(tx);

        // merge results as they arrive; order does not matter
        let mut aggregator = JobAggregator::new(expected_workers);
        let mut kill_watch_alive = true;
        while !aggregator.is_complete() {
            tokio::select! {
                changed = kill_rx.changed(), if kill_watch_alive => {
                    match changed {
                        Ok(()) if *kill_rx.borrow() => {
                            info!(
                                job_id = job.job_id,
                                outstanding = aggregator.expected_workers() - aggregator.completed_workers(),
                                "kill signal received, abandoning in-flight workers"
                            );
                            return Ok(None);
                        }
                        Ok(()) => {}
                        Err(_) => kill_watch_alive = false,
                    }
                }
                received = rx.recv() => {
                    match received {
                        Some(result) => {
                            aggregator.apply(result);
                        }
                        None => {
                            return Err(ValidatorError::Internal(
                                "chunk result channel closed before completion".to_string(),
                            ));
                        }
                    }
                }
            }
        }

        Ok(Some(aggregator.into_report(&prepared, resource_issues)))
    }

    /// Starts one semaphore-bounded pool per evaluation unit and dispatches
    /// every chunk as an independent task posting back on `tx`.
    fn dispatch_workers(
        &self,
        chain: &EvaluationChain,
        prepared: &PreparedDataFile,
        tx: &mpsc::Sender<ChunkResult>,
    ) -> Result<()> {
        chain.run_record_evaluation(|unit| {
            let pool = Arc::new(Semaphore::new(unit.data_files().len().max(1)));
            for chunk in unit.data_files() {
                let chunk = chunk.clone();
                let evaluator = unit.evaluator();
                let collectors = unit.collectors().clone();
                let tx = tx.clone();
                let pool = Arc::clone(&pool);
                tokio::spawn(async move {
                    let _permit = pool.acquire_owned().await.ok();
                    let fallback = chunk.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        process_chunk(&chunk, evaluator.as_ref(), &collectors)
                    })
                    .await
                    .unwrap_or_else(|e| ChunkResult {
                        data_file: fallback,
                        outcome: ChunkOutcome::Failed(format!("worker task died: {e}")),
                    });
                    // the coordinator may already be gone after a kill
                    let _ = tx.send(result).await;
                });
            }
            Ok(())
        })?;

        let prepared = Arc::new(prepared.clone());
        chain.run_collection_evaluation(|_, unit| {
            if unit.kind() != CollectionUnitKind::Checklist {
                return Ok(());
            }
            let prepared = Arc::clone(&prepared);
            let target = unit.target().clone();
            let evaluator = unit.evaluator();
            let tx = tx.clone();
            tokio::spawn(async move {
                let fallback = target.clone();
                let result = tokio::task::spawn_blocking(move || {
                    process_collection(&prepared, &target, evaluator.as_ref())
                })
                .await
                .unwrap_or_else(|e| ChunkResult {
                    data_file: fallback,
                    outcome: ChunkOutcome::Failed(format!("worker task died: {e}")),
                });
                let _ = tx.send(result).await;
            });
            Ok(())
        })?;
        Ok(())
    }

    fn delete_working_dir(&self, working_dir: &Path) {
        if self.preserve_temporary_files {
            debug!("preserving working directory {}", working_dir.display());
            return;
        }
        if working_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(working_dir) {
                warn!("failed to delete working directory {}: {e}", working_dir.display());
            }
        }
    }
}

fn killed(kill_rx: &watch::Receiver<bool>) -> bool {
    *kill_rx.borrow()
}

/// Splits every per-record schema of the prepared input; checklist schemas
/// stay whole for their single collection worker.
fn split_record_schemas(
    prepared: &PreparedDataFile,
    split_size: u64,
    working_dir: &Path,
) -> Result<Vec<(RowType, Vec<String>, Vec<DataFile>)>> {
    let mut inputs = Vec::new();
    for df in prepared.tabular_files() {
        let Some(row_type) = df.row_type.clone() else {
            continue;
        };
        if row_type.requires_collection_evaluation() {
            continue;
        }
        let chunks = DataFileSplitter::split_data_file(df, split_size, working_dir)?;
        inputs.push((row_type, df.columns.clone(), chunks));
    }
    Ok(inputs)
}
