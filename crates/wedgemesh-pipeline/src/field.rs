//! Named 2-D scalar fields and the archives that hold them.
//!
//! A simulation snapshot stores several fields (density, pressure,
//! temperature, ...) under string keys. The [`FieldArchive`] trait is
//! the seam between this sans-IO crate and whatever container format
//! the snapshot lives in; `wedgemesh-io` implements it for `.npz` files
//! and [`MemoryArchive`] implements it for in-memory arrays.

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::types::{Dimensions, PipelineError};

/// A named 2-D array of floating-point samples.
///
/// Rows map to raster rows (top to bottom) and columns to raster
/// columns, so the field's shape is also the rendered image's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    key: String,
    values: Array2<f64>,
}

impl ScalarField {
    /// Wrap an array under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidField`] if the array has no
    /// samples or a side longer than `u32::MAX`.
    pub fn new(key: impl Into<String>, values: Array2<f64>) -> Result<Self, PipelineError> {
        let key = key.into();
        if values.is_empty() {
            return Err(PipelineError::InvalidField {
                key,
                reason: format!("shape {:?} has no samples", values.shape()),
            });
        }
        if u32::try_from(values.nrows()).is_err() || u32::try_from(values.ncols()).is_err() {
            return Err(PipelineError::InvalidField {
                key,
                reason: format!("shape {:?} exceeds raster limits", values.shape()),
            });
        }
        Ok(Self { key, values })
    }

    /// The key this field was stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw samples, indexed `[row, column]`.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Raster dimensions: width is the column count, height the row count.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn dimensions(&self) -> Dimensions {
        // Both sides were checked against u32 in `new`.
        Dimensions {
            width: self.values.ncols() as u32,
            height: self.values.nrows() as u32,
        }
    }

    /// Minimum and maximum over the finite samples.
    ///
    /// Returns `None` when no sample is finite.
    #[must_use]
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A keyed collection of 2-D fields.
pub trait FieldArchive {
    /// All keys in the archive, in stable order.
    fn keys(&self) -> Vec<String>;

    /// Whether `key` is present.
    fn has_key(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    /// Read the array stored under `key`.
    ///
    /// # Errors
    ///
    /// Implementations return [`PipelineError::MissingFieldKey`] for an
    /// absent key and [`PipelineError::Archive`] or
    /// [`PipelineError::InvalidField`] for unreadable data.
    fn get_array(&mut self, key: &str) -> Result<ScalarField, PipelineError>;
}

/// Load the field stored under `key`.
///
/// Checks presence first so the error names every available key.
///
/// # Errors
///
/// Returns [`PipelineError::MissingFieldKey`] if `key` is absent, or
/// whatever the archive reports when the array cannot be read.
pub fn load_field<A: FieldArchive + ?Sized>(
    archive: &mut A,
    key: &str,
) -> Result<ScalarField, PipelineError> {
    if !archive.has_key(key) {
        return Err(PipelineError::MissingFieldKey {
            key: key.to_string(),
            available: archive.keys(),
        });
    }
    archive.get_array(key)
}

/// An archive backed by in-memory arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryArchive {
    fields: BTreeMap<String, Array2<f64>>,
}

impl MemoryArchive {
    /// An empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `values` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, values: Array2<f64>) {
        self.fields.insert(key.into(), values);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, values: Array2<f64>) -> Self {
        self.insert(key, values);
        self
    }
}

impl FieldArchive for MemoryArchive {
    fn keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn has_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    fn get_array(&mut self, key: &str) -> Result<ScalarField, PipelineError> {
        let values = self
            .fields
            .get(key)
            .ok_or_else(|| PipelineError::MissingFieldKey {
                key: key.to_string(),
                available: self.keys(),
            })?;
        ScalarField::new(key, values.clone())
    }
}
