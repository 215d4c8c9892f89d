pub mod prepare;
pub mod reader;

pub use prepare::{ArchiveManifest, DefaultSourcePreparer, ManifestEntry, ARCHIVE_MANIFEST};
pub use reader::{open_record_source, TabularFileReader};
