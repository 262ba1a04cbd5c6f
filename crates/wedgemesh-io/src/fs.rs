//! Filesystem helpers with path-annotated errors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IoError;

/// Delete `dir` and everything in it, then recreate it empty.
///
/// A missing directory is simply created. Nothing is deleted if `dir`
/// is, or contains, any of `keep`; paths are compared after
/// canonicalization so `..` and symlinks cannot hide the overlap.
///
/// # Errors
///
/// Returns [`IoError::OutputContainsInput`] if clearing would delete
/// one of `keep`, and [`IoError::Fs`] if canonicalization, removal or
/// creation fails.
pub fn clear_output_directory(dir: &Path, keep: &[&Path]) -> Result<(), IoError> {
    ensure_disjoint(dir, keep)?;
    match fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!(dir = %dir.display(), "cleared output directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(IoError::fs(dir, e)),
    }
    ensure_dir(dir)
}

/// Fail if any of `inputs` lies at or below `dir`.
fn ensure_disjoint(dir: &Path, inputs: &[&Path]) -> Result<(), IoError> {
    let root = match fs::canonicalize(dir) {
        Ok(root) => root,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(IoError::fs(dir, e)),
    };
    for &input in inputs {
        let resolved = fs::canonicalize(input).map_err(|e| IoError::fs(input, e))?;
        if resolved.starts_with(&root) {
            return Err(IoError::OutputContainsInput {
                output: dir.to_path_buf(),
                input: input.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Create `dir` and its parents if they do not exist.
///
/// # Errors
///
/// Returns [`IoError::Fs`] on failure.
pub fn ensure_dir(dir: &Path) -> Result<(), IoError> {
    fs::create_dir_all(dir).map_err(|e| IoError::fs(dir, e))
}

/// Files directly in `dir` with extension `ext` (no dot), sorted by
/// path.
///
/// # Errors
///
/// Returns [`IoError::Fs`] if the directory cannot be read.
pub fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, IoError> {
    let entries = fs::read_dir(dir).map_err(|e| IoError::fs(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| IoError::fs(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write `contents` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`IoError::Fs`] on failure.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|e| IoError::fs(path, e))
}

/// Read the whole of `path`.
///
/// # Errors
///
/// Returns [`IoError::Fs`] on failure.
pub fn read_file(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|e| IoError::fs(path, e))
}

/// Read `path` as UTF-8 text.
///
/// # Errors
///
/// Returns [`IoError::Fs`] on failure, including invalid UTF-8.
pub fn read_text(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|e| IoError::fs(path, e))
}

/// Write a shell script and mark it executable on Unix.
///
/// # Errors
///
/// Returns [`IoError::Fs`] on failure.
pub fn write_script(path: &Path, contents: &str) -> Result<(), IoError> {
    write_file(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| IoError::fs(path, e))?;
    }
    Ok(())
}

/// The file name of `path` without its extension, or the empty string.
#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The file name of `path`, or the empty string.
#[must_use]
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
