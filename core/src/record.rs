//! Durable record of the last completed sweep.

use std::io;
use std::path::{Path, PathBuf};

use sweep_utils::atomic_write;
use thiserror::Error;

use crate::runner::SweepReport;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to serialize sweep record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write sweep record to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Replace the file at `path` with `report` as pretty-printed JSON.
///
/// Readers see either the previous record or the new one, never a partial file.
pub fn write_record(path: &Path, report: &SweepReport) -> Result<(), RecordError> {
    let mut json = serde_json::to_vec_pretty(report)?;
    json.push(b'\n');
    atomic_write(path, &json).map_err(|source| RecordError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Wrote sweep record");
    Ok(())
}
