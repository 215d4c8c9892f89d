//! Parallel evaluation of data packages: file splitting, evaluation
//! chain planning, chunk workers and the per-job processing coordinator.

pub mod chain;
pub mod collector;
pub mod coordinator;
pub mod evaluator;
pub mod source;
pub mod splitter;
pub mod worker;

pub use chain::{CollectionUnitKind, EvaluationChain, EvaluationChainBuilder};
pub use collector::{CollectorGroup, CollectorGroupProvider};
pub use coordinator::{JobAggregator, ParallelProcessingCoordinator};
pub use evaluator::EvaluatorFactory;
pub use source::{DefaultSourcePreparer, ARCHIVE_MANIFEST};
pub use splitter::DataFileSplitter;
pub use worker::{ChunkOutcome, ChunkResult};
