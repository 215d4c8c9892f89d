use std::fs::File;
use std::path::Path;

use validator_core::errors::{Result, ValidatorError};
use validator_core::models::DataFile;
use validator_core::traits::RecordSource;

/// Record source over a character-delimited file.
pub struct TabularFileReader {
    reader: csv::Reader<File>,
    headers: Option<Vec<String>>,
}

impl TabularFileReader {
    pub fn open(path: &Path, delimiter: u8, has_headers: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ValidatorError::RecordSource(format!("cannot open {}: {e}", path.display()))
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(file);

        let headers = if has_headers {
            let headers = reader
                .headers()
                .map_err(|e| ValidatorError::RecordSource(format!("cannot read headers: {e}")))?;
            Some(headers.iter().map(str::to_string).collect())
        } else {
            None
        };

        Ok(Self { reader, headers })
    }
}

impl RecordSource for TabularFileReader {
    fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    fn read(&mut self) -> Result<Option<Vec<String>>> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Ok(Some(record.iter().map(str::to_string).collect())),
            Ok(false) => Ok(None),
            Err(e) => Err(ValidatorError::RecordSource(format!(
                "record read failed: {e}"
            ))),
        }
    }
}

/// Original-file line number preceding the first record of a descriptor.
/// Chunks carry their offset; unsplit files only need the header adjust.
/// The n-th record (1-based) of the descriptor sits at original line
/// `record_line_base(df) + n`.
pub fn record_line_base(data_file: &DataFile) -> u64 {
    data_file
        .line_offset
        .unwrap_or(u64::from(data_file.has_headers))
}

/// Opens a record source matching a tabular descriptor (schema file or
/// split chunk).
pub fn open_record_source(data_file: &DataFile) -> Result<Box<dyn RecordSource>> {
    Ok(Box::new(TabularFileReader::open(
        &data_file.file_path,
        data_file.delimiter,
        data_file.has_headers,
    )?))
}
