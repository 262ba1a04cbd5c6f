//! Batch meshing: `.npy` point lists to Gmsh `.geo` scripts, and
//! optionally to `.msh` meshes through an external `gmsh`.
//!
//! Each point list is checked against the topology before anything is
//! written for it; a count mismatch skips the file and is recorded.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use wedgemesh_pipeline::MeshTopology;

use crate::batch::{BatchReport, run_units};
use crate::error::IoError;
use crate::error_log::SkippedUnit;
use crate::fs::{
    clear_output_directory, ensure_dir, file_name, file_stem, list_files, read_file, write_file,
};

/// Settings for [`run_meshing`].
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Directory scanned for `.npy` point lists.
    pub points_dir: PathBuf,
    /// Directory receiving `<stem>.geo` (and `<stem>.msh`).
    pub output_dir: PathBuf,
    /// Expected boundary layout.
    pub topology: MeshTopology,
    /// Executable to run on each script; `None` writes scripts only.
    pub gmsh: Option<PathBuf>,
    /// Empty `output_dir` before any file is meshed.
    pub clear_output: bool,
    /// Worker threads; `0` or `1` runs sequentially.
    pub jobs: usize,
    /// CSV file receiving skipped files.
    pub error_log: Option<PathBuf>,
}

/// A successfully meshed point list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshedUnit {
    /// Source point list.
    pub points: PathBuf,
    /// Written Gmsh script.
    pub geo: PathBuf,
    /// Mesh produced by gmsh, when it was run.
    pub msh: Option<PathBuf>,
}

/// Run `gmsh` on `geo`, writing a 2-D mesh to `msh`.
///
/// # Errors
///
/// Returns [`IoError::Gmsh`] if the process cannot be spawned or exits
/// unsuccessfully.
pub fn run_gmsh(gmsh: &Path, geo: &Path, msh: &Path) -> Result<(), IoError> {
    let output = Command::new(gmsh)
        .arg(geo)
        .arg("-2")
        .arg("-o")
        .arg(msh)
        .output()
        .map_err(|e| IoError::Gmsh {
            path: geo.to_path_buf(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IoError::Gmsh {
            path: geo.to_path_buf(),
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

fn mesh_unit(points_path: &Path, options: &MeshOptions) -> Result<MeshedUnit, IoError> {
    let points = wedgemesh_export::from_npy(&read_file(points_path)?)?;
    let title = file_name(points_path);
    let script = wedgemesh_export::to_geo(&points, &options.topology, Some(&title))?;

    let stem = file_stem(points_path);
    let geo = options.output_dir.join(format!("{stem}.geo"));
    write_file(&geo, script)?;

    let msh = match &options.gmsh {
        Some(gmsh) => {
            let msh = options.output_dir.join(format!("{stem}.msh"));
            run_gmsh(gmsh, &geo, &msh)?;
            Some(msh)
        }
        None => None,
    };

    Ok(MeshedUnit {
        points: points_path.to_path_buf(),
        geo,
        msh,
    })
}

/// Mesh every `.npy` point list in `options.points_dir`.
///
/// # Errors
///
/// Returns an error only for batch-level failures (see
/// [`run_extraction`](crate::batch::run_extraction)); per-file
/// failures, including point-count mismatches, are reported in
/// [`BatchReport::skipped`].
pub fn run_meshing(options: &MeshOptions) -> Result<BatchReport<MeshedUnit>, IoError> {
    let files = list_files(&options.points_dir, "npy")?;
    if options.clear_output {
        clear_output_directory(&options.output_dir, &[options.points_dir.as_path()])?;
    } else {
        ensure_dir(&options.output_dir)?;
    }

    tracing::info!(
        files = files.len(),
        vertices = options.topology.vertex_count(),
        gmsh = options.gmsh.is_some(),
        "starting meshing"
    );

    let results = run_units(&files, options.jobs, |path| {
        let name = file_name(path);
        mesh_unit(path, options)
            .inspect(|done| tracing::info!(file = %name, geo = %done.geo.display(), "meshed"))
            .map_err(|e| {
                tracing::warn!(file = %name, kind = e.kind(), "skipped: {e}");
                SkippedUnit::new(name, "", &e)
            })
    })?;

    let report = BatchReport::from_results(results);
    report.write_error_log(options.error_log.as_deref())?;
    Ok(report)
}
