//! Batch extraction: every selected archive and key through the
//! pipeline, one `.npy` point list per unit.
//!
//! A unit is one (archive, key) pair. Units are independent: each reads
//! its own archive and writes its own output file, so they can run on
//! a worker pool. A failing unit is logged and recorded; the batch
//! carries on.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use wedgemesh_pipeline::{FileMetadata, MetadataFilter, PipelineConfig};

use crate::error::IoError;
use crate::error_log::{SkippedUnit, write_error_log};
use crate::fs::{clear_output_directory, ensure_dir, file_name, file_stem, list_files, write_file};
use crate::npz::NpzArchive;

/// Outcome of a batch: what was produced and what was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport<T> {
    /// Successful units, in unit order.
    pub processed: Vec<T>,
    /// Failed units, in unit order.
    pub skipped: Vec<SkippedUnit>,
}

impl<T> BatchReport<T> {
    pub(crate) fn from_results(results: Vec<Result<T, SkippedUnit>>) -> Self {
        let mut processed = Vec::new();
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(unit) => processed.push(unit),
                Err(unit) => skipped.push(unit),
            }
        }
        Self { processed, skipped }
    }

    /// Write the skipped units to `path` (if given).
    ///
    /// # Errors
    ///
    /// See [`write_error_log`].
    pub fn write_error_log(&self, path: Option<&Path>) -> Result<(), IoError> {
        match path {
            Some(path) => write_error_log(path, &self.skipped),
            None => Ok(()),
        }
    }
}

/// Run `work` over `units`, in parallel when `jobs > 1`.
///
/// Results keep the order of `units` either way.
///
/// # Errors
///
/// Returns [`IoError::ThreadPool`] if the pool cannot be built.
pub(crate) fn run_units<U, T, F>(units: &[U], jobs: usize, work: F) -> Result<Vec<T>, IoError>
where
    U: Sync,
    T: Send,
    F: Fn(&U) -> T + Sync + Send,
{
    if jobs <= 1 {
        return Ok(units.iter().map(work).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    Ok(pool.install(|| units.par_iter().map(work).collect()))
}

/// Settings for [`run_extraction`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory scanned (non-recursively) for `.npz` archives.
    pub input_dir: PathBuf,
    /// Directory receiving `<stem>_<key>.npy` point lists.
    pub output_dir: PathBuf,
    /// Field keys to extract from every archive.
    pub keys: Vec<String>,
    /// Only archives whose filename metadata matches are processed.
    pub filter: MetadataFilter,
    /// Empty `output_dir` before any unit runs.
    pub clear_output: bool,
    /// Worker threads; `0` or `1` runs sequentially.
    pub jobs: usize,
    /// CSV file receiving skipped units.
    pub error_log: Option<PathBuf>,
}

/// One (archive, key) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractUnit {
    /// The archive.
    pub archive: PathBuf,
    /// The field key.
    pub key: String,
}

/// A successfully extracted unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedUnit {
    /// Source archive.
    pub archive: PathBuf,
    /// Field key.
    pub key: String,
    /// Written point list.
    pub output: PathBuf,
    /// Number of boundary points written.
    pub point_count: usize,
}

/// Name of the point-list file for `archive` / `key`.
#[must_use]
pub fn output_name(archive: &Path, key: &str) -> String {
    format!("{}_{key}.npy", file_stem(archive))
}

/// List the units for `options`: sorted archives whose names parse and
/// pass the filter, crossed with the keys.
///
/// # Errors
///
/// Returns [`IoError::Fs`] if the input directory cannot be read.
pub fn discover_units(options: &ExtractOptions) -> Result<Vec<ExtractUnit>, IoError> {
    let mut units = Vec::new();
    for archive in list_files(&options.input_dir, "npz")? {
        let name = file_name(&archive);
        let Some(meta) = FileMetadata::parse(&name) else {
            tracing::debug!(%name, "filename does not encode parameters, ignoring");
            continue;
        };
        if !options.filter.matches(&meta) {
            tracing::debug!(%name, "filtered out");
            continue;
        }
        for key in &options.keys {
            units.push(ExtractUnit {
                archive: archive.clone(),
                key: key.clone(),
            });
        }
    }
    Ok(units)
}

fn extract_unit(
    unit: &ExtractUnit,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<ExtractedUnit, IoError> {
    let _unit = tracing::info_span!(
        "unit",
        archive = %file_name(&unit.archive),
        key = %unit.key
    )
    .entered();
    let mut archive = NpzArchive::open(&unit.archive)?;
    let result = wedgemesh_pipeline::process_archive(&mut archive, &unit.key, config)?;
    let bytes = wedgemesh_export::to_npy(result.points.points())?;
    let output = output_dir.join(output_name(&unit.archive, &unit.key));
    write_file(&output, bytes)?;
    Ok(ExtractedUnit {
        archive: unit.archive.clone(),
        key: unit.key.clone(),
        output,
        point_count: result.points.len(),
    })
}

/// Run the pipeline over every unit and write the point lists.
///
/// Output-directory clearing (when requested) finishes before any unit
/// starts. The error log, when configured, is written after all units
/// finish.
///
/// # Errors
///
/// Returns an error only for batch-level failures: invalid
/// configuration, unreadable input directory, output directory
/// preparation (including a cleared output that would swallow the
/// input directory), worker pool creation, or error-log writing. Per-unit
/// failures are reported in [`BatchReport::skipped`].
pub fn run_extraction(
    options: &ExtractOptions,
    config: &PipelineConfig,
) -> Result<BatchReport<ExtractedUnit>, IoError> {
    config.validate()?;
    let units = discover_units(options)?;

    if options.clear_output {
        clear_output_directory(&options.output_dir, &[options.input_dir.as_path()])?;
    } else {
        ensure_dir(&options.output_dir)?;
    }

    tracing::info!(
        units = units.len(),
        jobs = options.jobs,
        input = %options.input_dir.display(),
        "starting extraction"
    );

    let results = run_units(&units, options.jobs, |unit| {
        extract_unit(unit, &options.output_dir, config)
            .inspect(|done| {
                tracing::info!(
                    archive = %file_name(&done.archive),
                    key = %done.key,
                    points = done.point_count,
                    "extracted"
                );
            })
            .map_err(|e| {
                let name = file_name(&unit.archive);
                tracing::warn!(
                    archive = %name,
                    key = %unit.key,
                    kind = e.kind(),
                    "skipped: {e}"
                );
                SkippedUnit::new(name, unit.key.clone(), &e)
            })
    })?;

    let report = BatchReport::from_results(results);
    report.write_error_log(options.error_log.as_deref())?;
    Ok(report)
}
