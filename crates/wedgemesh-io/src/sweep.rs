//! Solver sweep directories.
//!
//! For every mesh in a directory and every flow condition, writes a
//! case directory holding the mesh copy, `case.cfg`, `run.sh` and
//! `submit.slurm`. Optionally writes `submit_all.slurm` at the root,
//! which submits every case when run from that directory.
//!
//! Conditions come either from the mesh filename (Mach and pressure,
//! crossed with a temperature list) or from an explicit grid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wedgemesh_export::slurm::{self, CASE_CONFIG_FILE, SlurmConfig};
use wedgemesh_export::su2::{self, GasProperties, SweepCase};
use wedgemesh_pipeline::FileMetadata;

use crate::batch::BatchReport;
use crate::error::IoError;
use crate::error_log::SkippedUnit;
use crate::fs::{
    clear_output_directory, ensure_dir, file_name, file_stem, list_files, read_text, write_file,
    write_script,
};

/// Name of the master submission script.
pub const SUBMIT_ALL_FILE: &str = "submit_all.slurm";

/// Where flow conditions come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepConditions {
    /// Mach and pressure parsed from each mesh filename, one case per
    /// temperature.
    FromFilename {
        /// Static temperatures in kelvin.
        temperatures: Vec<f64>,
    },
    /// Every combination of the listed values, for every mesh.
    Grid {
        /// Mach numbers.
        machs: Vec<f64>,
        /// Static temperatures in kelvin.
        temperatures: Vec<f64>,
        /// Static pressures in pascals.
        pressures: Vec<f64>,
    },
}

impl SweepConditions {
    /// Temperatures used when none are given.
    pub const DEFAULT_TEMPERATURES: [f64; 3] = [250.0, 275.0, 300.0];

    /// The cases for the mesh at `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnparsableFilename`] if conditions come from
    /// the filename and it does not follow the naming convention.
    pub fn cases_for(&self, mesh: &Path) -> Result<Vec<SweepCase>, IoError> {
        match self {
            Self::FromFilename { temperatures } => {
                let meta = FileMetadata::parse(&file_name(mesh)).ok_or_else(|| {
                    IoError::UnparsableFilename {
                        path: mesh.to_path_buf(),
                    }
                })?;
                Ok(SweepCase::grid(
                    &[meta.mach],
                    temperatures,
                    &[f64::from(meta.pressure)],
                ))
            }
            Self::Grid {
                machs,
                temperatures,
                pressures,
            } => Ok(SweepCase::grid(machs, temperatures, pressures)),
        }
    }
}

impl Default for SweepConditions {
    fn default() -> Self {
        Self::FromFilename {
            temperatures: Self::DEFAULT_TEMPERATURES.to_vec(),
        }
    }
}

/// Settings for [`run_sweep`].
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Directory scanned for meshes.
    pub mesh_dir: PathBuf,
    /// Mesh file extension (no dot).
    pub mesh_extension: String,
    /// Solver configuration template.
    pub template: PathBuf,
    /// Root of the generated case directories.
    pub output_dir: PathBuf,
    /// Flow conditions.
    pub conditions: SweepConditions,
    /// Gas constants for the inlet velocity.
    pub gas: GasProperties,
    /// Scheduler settings.
    pub slurm: SlurmConfig,
    /// Also write `submit_all.slurm`.
    pub master_script: bool,
    /// Empty `output_dir` first.
    pub clear_output: bool,
    /// CSV file receiving skipped meshes and cases.
    pub error_log: Option<PathBuf>,
}

/// One written case directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepCaseDir {
    /// Source mesh.
    pub mesh: PathBuf,
    /// Flow condition.
    pub case: SweepCase,
    /// The case directory.
    pub dir: PathBuf,
}

fn write_case(
    mesh: &Path,
    case: &SweepCase,
    template: &str,
    options: &SweepOptions,
) -> Result<SweepCaseDir, IoError> {
    let mesh_name = file_name(mesh);
    let config_text = su2::render_case(template, case, &options.gas, &mesh_name)?;

    let name = case.case_name(&file_stem(mesh));
    let dir = options.output_dir.join(&name);
    ensure_dir(&dir)?;

    let mesh_copy = dir.join(&mesh_name);
    std::fs::copy(mesh, &mesh_copy).map_err(|e| IoError::fs(&mesh_copy, e))?;
    write_file(&dir.join(CASE_CONFIG_FILE), config_text)?;
    write_script(&dir.join("run.sh"), &slurm::run_script(&options.slurm))?;
    write_file(
        &dir.join("submit.slurm"),
        slurm::submit_script(&name, &options.slurm),
    )?;

    Ok(SweepCaseDir {
        mesh: mesh.to_path_buf(),
        case: *case,
        dir,
    })
}

/// Generate every case directory.
///
/// A mesh whose conditions cannot be derived, or a case whose template
/// substitution fails, is skipped and recorded; other cases continue.
///
/// # Errors
///
/// Returns an error for batch-level failures: unreadable template or
/// mesh directory, output directory preparation, master script or
/// error-log writing.
pub fn run_sweep(options: &SweepOptions) -> Result<BatchReport<SweepCaseDir>, IoError> {
    let template = read_text(&options.template)?;
    let meshes = list_files(&options.mesh_dir, &options.mesh_extension)?;
    if options.clear_output {
        clear_output_directory(
            &options.output_dir,
            &[options.mesh_dir.as_path(), options.template.as_path()],
        )?;
    } else {
        ensure_dir(&options.output_dir)?;
    }

    let mut results = Vec::new();
    for mesh in &meshes {
        let mesh_name = file_name(mesh);
        let cases = match options.conditions.cases_for(mesh) {
            Ok(cases) => cases,
            Err(e) => {
                tracing::warn!(mesh = %mesh_name, kind = e.kind(), "skipped: {e}");
                results.push(Err(SkippedUnit::new(mesh_name, "", &e)));
                continue;
            }
        };
        for case in &cases {
            let result = write_case(mesh, case, &template, options).map_err(|e| {
                let label = case.case_name(&file_stem(mesh));
                tracing::warn!(
                    mesh = %mesh_name,
                    case = %label,
                    kind = e.kind(),
                    "skipped: {e}"
                );
                SkippedUnit::new(mesh_name.clone(), label, &e)
            });
            results.push(result);
        }
    }

    let report = BatchReport::from_results(results);
    tracing::info!(
        meshes = meshes.len(),
        cases = report.processed.len(),
        skipped = report.skipped.len(),
        "sweep written"
    );

    if options.master_script {
        let mut names: Vec<String> = report
            .processed
            .iter()
            .map(|c| file_name(&c.dir))
            .collect();
        names.sort();
        write_script(
            &options.output_dir.join(SUBMIT_ALL_FILE),
            &slurm::submit_all_script(&names),
        )?;
    }

    report.write_error_log(options.error_log.as_deref())?;
    Ok(report)
}
