use crate::engine::output::LineResult;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV to '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes `results` as CSV with a header row, one record per line.
pub fn write_csv<W: Write>(writer: W, results: &[LineResult]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_path(path: &Path, results: &[LineResult]) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_csv(file, results).map_err(|e| ExportError::Csv {
        path: path.to_path_buf(),
        source: e,
    })
}
