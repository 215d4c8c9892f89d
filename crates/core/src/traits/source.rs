use std::path::Path;

use crate::errors::Result;
use crate::models::data_file::{DataFile, PreparedDataFile};

/// A source of raw records (file, archive component, ...).
pub trait RecordSource: Send {
    /// Headers of the source, when it declares any.
    fn headers(&self) -> Option<&[String]>;

    /// Next record, or `None` on end of input.
    fn read(&mut self) -> Result<Option<Vec<String>>>;
}

/// Format-specific preparation of a submitted descriptor: populates columns,
/// row types and line counts, and explodes an archive into its per-schema
/// files.
pub trait SourcePreparer: Send + Sync {
    fn prepare(&self, data_file: &DataFile, working_dir: &Path) -> Result<PreparedDataFile>;
}
