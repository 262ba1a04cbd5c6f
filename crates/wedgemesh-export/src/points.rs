//! Point-list artifacts in NumPy `.npy` format.
//!
//! An ordered boundary is stored as an `(n, 2)` `float64` array, one
//! `(x, y)` row per point. There is no header beyond the `.npy`
//! preamble: row order is the payload and is preserved exactly on
//! read.

use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use wedgemesh_pipeline::Point;

use crate::error::ExportError;

/// Encode `points` as an `(n, 2)` `.npy` array.
///
/// # Errors
///
/// Returns [`ExportError::NpyWrite`] if the array cannot be encoded.
pub fn to_npy(points: &[Point]) -> Result<Vec<u8>, ExportError> {
    let array = Array2::from_shape_fn((points.len(), 2), |(row, col)| {
        let p = points[row];
        if col == 0 { p.x } else { p.y }
    });
    let mut bytes = Vec::new();
    array.write_npy(&mut bytes)?;
    Ok(bytes)
}

/// Decode an `(n, 2)` `.npy` array into points, in row order.
///
/// # Errors
///
/// Returns [`ExportError::NpyRead`] if `bytes` is not a 2-D `float64`
/// `.npy` array, or [`ExportError::InvalidPointArray`] if it does not
/// have exactly two columns.
pub fn from_npy(bytes: &[u8]) -> Result<Vec<Point>, ExportError> {
    let array = Array2::<f64>::read_npy(bytes)?;
    let (rows, cols) = array.dim();
    if cols != 2 {
        return Err(ExportError::InvalidPointArray { rows, cols });
    }
    Ok(array
        .rows()
        .into_iter()
        .map(|row| Point::new(row[0], row[1]))
        .collect())
}
