//! Error type shared by every serializer in this crate.

use ndarray_npy::{ReadNpyError, WriteNpyError};

/// Errors produced while serializing or parsing export artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Encoding a point list as `.npy` failed.
    #[error("failed to encode .npy array: {0}")]
    NpyWrite(#[from] WriteNpyError),

    /// Decoding a `.npy` point list failed.
    #[error("failed to decode .npy array: {0}")]
    NpyRead(#[from] ReadNpyError),

    /// A decoded array is not shaped `(n, 2)`.
    #[error("point array must have shape (n, 2), got ({rows}, {cols})")]
    InvalidPointArray {
        /// Number of rows in the decoded array.
        rows: usize,
        /// Number of columns in the decoded array.
        cols: usize,
    },

    /// A solver configuration template lacks a key that must be
    /// substituted.
    #[error("template has no '{key}' entry")]
    MissingTemplateKey {
        /// The absent key.
        key: String,
    },
}

impl ExportError {
    /// Short stable identifier for logs and CSV reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NpyWrite(_) => "npy_write",
            Self::NpyRead(_) => "npy_read",
            Self::InvalidPointArray { .. } => "invalid_point_array",
            Self::MissingTemplateKey { .. } => "missing_template_key",
        }
    }
}
