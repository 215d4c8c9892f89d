use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use validator_core::errors::{Result, ValidatorError};
use validator_core::models::DataFile;

/// Handles the file splitting strategy for one schema file.
///
/// Splitting happens on raw lines: the header line of the original file ends
/// up in the first chunk, which is the only chunk keeping the header flag.
pub struct DataFileSplitter;

impl DataFileSplitter {
    /// Splits `data_file` into chunk descriptors of at most `split_size`
    /// lines each. When no split is required the returned list contains the
    /// provided descriptor unchanged and no file is written.
    ///
    /// The descriptor must carry `row_type`, `num_of_lines` and an existing
    /// `file_path`; chunks are written under `<base_dir>/<RowType>_split`.
    pub fn split_data_file(
        data_file: &DataFile,
        split_size: u64,
        base_dir: &Path,
    ) -> Result<Vec<DataFile>> {
        let row_type = data_file.row_type.as_ref().ok_or_else(|| {
            ValidatorError::InvalidDataFile("DataFile rowType shall be provided".to_string())
        })?;
        let num_of_lines = data_file.num_of_lines.ok_or_else(|| {
            ValidatorError::InvalidDataFile("DataFile numOfLines shall be provided".to_string())
        })?;

        if num_of_lines <= split_size {
            return Ok(vec![data_file.clone()]);
        }

        let split_dir = base_dir.join(format!("{}_split", row_type.simple_name()));
        let chunk_paths = split_file(&data_file.file_path, split_size, &split_dir)?;
        debug!(
            row_type = %row_type,
            chunks = chunk_paths.len(),
            "split {} into {}", data_file.file_path.display(), split_dir.display()
        );

        // The offset counts original lines preceding a chunk's first data
        // record: the header line only shifts chunk 0, which consumes it.
        let input_has_headers = data_file.has_headers;
        let splits = chunk_paths
            .into_iter()
            .enumerate()
            .map(|(idx, path)| {
                let idx = idx as u64;
                let chunk_lines = split_size.min(num_of_lines - idx * split_size);
                data_file.split_child(
                    path,
                    input_has_headers && idx == 0,
                    chunk_lines,
                    idx * split_size + u64::from(input_has_headers && idx == 0),
                )
            })
            .collect();
        Ok(splits)
    }
}

/// Splits a text file into pieces of at most `split_size` lines, written as
/// `chunk_NNN` files under `output_dir`. The output directory must not exist
/// or be empty, and the input file must exist.
pub fn split_file(input: &Path, split_size: u64, output_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_file() {
        return Err(ValidatorError::Split(format!(
            "input file doesn't exist: {}",
            input.display()
        )));
    }
    if output_dir.exists() {
        if !output_dir.is_dir() {
            return Err(ValidatorError::Split(format!(
                "output path is not a directory: {}",
                output_dir.display()
            )));
        }
        if fs::read_dir(output_dir)?.next().is_some() {
            return Err(ValidatorError::Split(format!(
                "output directory should be empty: {}",
                output_dir.display()
            )));
        }
    } else {
        fs::create_dir_all(output_dir)?;
    }

    let reader = BufReader::new(File::open(input)?);
    let mut chunk_paths = Vec::new();
    let mut writer: Option<BufWriter<File>> = None;
    let mut lines_in_chunk = 0u64;

    for line in reader.lines() {
        let line = line?;
        if lines_in_chunk == 0 {
            if let Some(mut prev) = writer.take() {
                prev.flush()?;
            }
            let path = output_dir.join(format!("chunk_{:03}", chunk_paths.len()));
            writer = Some(BufWriter::new(File::create(&path)?));
            chunk_paths.push(path);
        }
        let out = writer.as_mut().ok_or_else(|| {
            ValidatorError::Internal("split writer not initialized".to_string())
        })?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        lines_in_chunk += 1;
        if lines_in_chunk == split_size {
            lines_in_chunk = 0;
        }
    }
    if let Some(mut last) = writer.take() {
        last.flush()?;
    }

    Ok(chunk_paths)
}

/// Counts the lines of a text file; an unterminated final line counts.
pub fn count_lines(path: &Path) -> Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0u64;
    for line in reader.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}
