pub mod evaluators;
pub mod source;
pub mod storage;

pub use evaluators::{
    CollectionEvaluator, MetadataEvaluator, RecordEvaluator, ResourceStructureEvaluator,
};
pub use source::{RecordSource, SourcePreparer};
pub use storage::JobStorage;
