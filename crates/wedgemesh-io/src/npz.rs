//! `.npz` archives as [`FieldArchive`]s.
//!
//! NumPy stores each array as `<name>.npy` inside a zip container. Keys
//! are exposed without the `.npy` suffix. Arrays may be `float64` or
//! `float32`; the latter are widened.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::{NpzReader, ReadNpzError};
use wedgemesh_pipeline::{FieldArchive, PipelineError, ScalarField};

use crate::error::IoError;

/// An open `.npz` archive.
pub struct NpzArchive {
    path: PathBuf,
    reader: NpzReader<File>,
    /// Key -> stored entry name.
    entries: BTreeMap<String, String>,
}

impl std::fmt::Debug for NpzArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NpzArchive")
            .field("path", &self.path)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl NpzArchive {
    /// Open `path` and index its entries.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Fs`] if the file cannot be opened, or
    /// [`IoError::Npz`] if it is not a readable zip archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| IoError::fs(&path, source))?;
        let npz_error = |source| IoError::Npz {
            path: path.clone(),
            source,
        };
        let mut reader = NpzReader::new(file).map_err(npz_error)?;
        let entries = reader
            .names()
            .map_err(npz_error)?
            .into_iter()
            .map(|name| {
                let key = name.strip_suffix(".npy").unwrap_or(&name).to_string();
                (key, name)
            })
            .collect();
        Ok(Self {
            path,
            reader,
            entries,
        })
    }

    /// The archive's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_f64(&mut self, entry: &str) -> Result<Array2<f64>, ReadNpzError> {
        match self.reader.by_name::<_, ndarray::Ix2>(entry) {
            Ok(array) => Ok(array),
            Err(f64_err) => self
                .reader
                .by_name::<ndarray::OwnedRepr<f32>, ndarray::Ix2>(entry)
                .map(|array| array.mapv(f64::from))
                .map_err(|_| f64_err),
        }
    }
}

impl FieldArchive for NpzArchive {
    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_array(&mut self, key: &str) -> Result<ScalarField, PipelineError> {
        let Some(entry) = self.entries.get(key).cloned() else {
            return Err(PipelineError::MissingFieldKey {
                key: key.to_string(),
                available: self.keys(),
            });
        };
        let values = self
            .read_f64(&entry)
            .map_err(|source| PipelineError::Archive {
                key: key.to_string(),
                message: source.to_string(),
            })?;
        ScalarField::new(key, values)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use ndarray::{Array1, array};
    use ndarray_npy::NpzWriter;

    use super::*;

    fn write_archive(dir: &Path) -> PathBuf {
        let path = dir.join("sample.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("density", &array![[0.0f64, 1.0], [2.0, 3.0]])
            .unwrap();
        npz.add_array("pressure", &array![[1.5f32, 2.5, 3.5]]).unwrap();
        npz.add_array("line", &Array1::<f64>::zeros(3)).unwrap();
        npz.finish().unwrap();
        path
    }

    #[test]
    fn keys_drop_npy_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let archive = NpzArchive::open(write_archive(dir.path())).unwrap();
        assert_eq!(archive.keys(), vec!["density", "line", "pressure"]);
        assert!(archive.has_key("density"));
        assert!(!archive.has_key("density.npy"));
    }

    #[test]
    fn reads_float64_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = NpzArchive::open(write_archive(dir.path())).unwrap();
        let field = archive.get_array("density").unwrap();
        assert_eq!(field.dimensions().width, 2);
        assert_eq!(field.dimensions().height, 2);
        assert_eq!(field.values()[[1, 0]], 2.0);
    }

    #[test]
    fn widens_float32_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = NpzArchive::open(write_archive(dir.path())).unwrap();
        let field = archive.get_array("pressure").unwrap();
        assert_eq!(field.dimensions().width, 3);
        assert_eq!(field.values()[[0, 2]], 3.5);
    }

    #[test]
    fn one_dimensional_entry_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = NpzArchive::open(write_archive(dir.path())).unwrap();
        let err = archive.get_array("line").unwrap_err();
        assert_eq!(err.kind(), "archive");
    }

    #[test]
    fn missing_key_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = NpzArchive::open(write_archive(dir.path())).unwrap();
        let err = archive.get_array("velocity").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingFieldKey { ref available, .. } if available.len() == 3
        ));
    }

    #[test]
    fn missing_file_is_fs_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NpzArchive::open(dir.path().join("absent.npz")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
