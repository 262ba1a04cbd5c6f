//! Error type for filesystem and orchestration failures.

use std::path::{Path, PathBuf};

use ndarray_npy::ReadNpzError;
use wedgemesh_export::ExportError;
use wedgemesh_pipeline::PipelineError;

/// Errors produced by the I/O layer.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Fs {
        /// The path being read, written or removed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An `.npz` archive could not be opened or listed.
    #[error("{}: {source}", path.display())]
    Npz {
        /// The archive.
        path: PathBuf,
        /// Underlying error.
        source: ReadNpzError,
    },

    /// A raster could not be encoded.
    #[error("{}: {source}", path.display())]
    Image {
        /// The destination file.
        path: PathBuf,
        /// Underlying error.
        source: image::ImageError,
    },

    /// Writing the error log failed.
    #[error("error log: {0}")]
    Csv(#[from] csv::Error),

    /// The external mesher could not be run or exited unsuccessfully.
    #[error("gmsh failed on {}: {message}", path.display())]
    Gmsh {
        /// The `.geo` script.
        path: PathBuf,
        /// Exit status or spawn error.
        message: String,
    },

    /// A filename does not follow the simulation naming convention.
    #[error("{}: filename does not encode ramp, Mach and pressure", path.display())]
    UnparsableFilename {
        /// The file.
        path: PathBuf,
    },

    /// Clearing the output directory would delete an input.
    #[error(
        "refusing to clear {}: it contains input {}",
        output.display(),
        input.display()
    )]
    OutputContainsInput {
        /// The output directory.
        output: PathBuf,
        /// The input it contains.
        input: PathBuf,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A pipeline stage failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A serializer failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IoError {
    /// Wrap a `std::io::Error` with the path it concerns.
    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Fs {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short stable identifier for logs and CSV reports.
    ///
    /// Wrapped pipeline and export errors report their own kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fs { .. } => "io",
            Self::Npz { .. } => "npz",
            Self::Image { .. } => "image",
            Self::Csv(_) => "csv",
            Self::Gmsh { .. } => "gmsh",
            Self::UnparsableFilename { .. } => "unparsable_filename",
            Self::OutputContainsInput { .. } => "output_contains_input",
            Self::ThreadPool(_) => "thread_pool",
            Self::Pipeline(e) => e.kind(),
            Self::Export(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_kind() {
        let err = IoError::from(PipelineError::NoContourFound);
        assert_eq!(err.kind(), "no_contour_found");
        assert_eq!(err.to_string(), PipelineError::NoContourFound.to_string());
    }

    #[test]
    fn fs_error_names_path() {
        let err = IoError::fs(
            "out/a.npy",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().starts_with("out/a.npy: "));
    }
}
