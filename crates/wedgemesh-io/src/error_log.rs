//! Per-unit failure records and their CSV log.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IoError;

/// A unit of work that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedUnit {
    /// Source file name (no directory).
    pub filename: String,
    /// Field key, or empty for stages that are not keyed.
    pub key: String,
    /// Stable error identifier (see the `kind()` methods).
    pub kind: String,
    /// Human-readable error message.
    #[serde(rename = "error")]
    pub message: String,
}

impl SkippedUnit {
    /// Record `error` against `filename` / `key`.
    #[must_use]
    pub fn new(filename: impl Into<String>, key: impl Into<String>, error: &IoError) -> Self {
        Self {
            filename: filename.into(),
            key: key.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Write `skipped` to `path` as CSV with header
/// `filename,key,kind,error`.
///
/// The header is written even when nothing was skipped.
///
/// # Errors
///
/// Returns [`IoError::Fs`] if the file cannot be created, or
/// [`IoError::Csv`] if a record cannot be written.
pub fn write_error_log(path: &Path, skipped: &[SkippedUnit]) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::fs(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    if skipped.is_empty() {
        writer.write_record(["filename", "key", "kind", "error"])?;
    }
    for unit in skipped {
        writer.serialize(unit)?;
    }
    writer.flush().map_err(|e| IoError::fs(path, e))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wedgemesh_pipeline::PipelineError;

    use super::*;

    #[test]
    fn header_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");
        write_error_log(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "filename,key,kind,error\n"
        );
    }

    #[test]
    fn records_kind_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");
        let err = IoError::from(PipelineError::PointCountMismatch {
            expected: 12,
            actual: 10,
        });
        let skipped = vec![SkippedUnit::new("a.npy", "", &err)];
        write_error_log(&path, &skipped).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<SkippedUnit> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows, skipped);
        assert_eq!(rows[0].kind, "point_count_mismatch");
        assert_eq!(rows[0].message, "expected 12 points, got 10");
    }
}
