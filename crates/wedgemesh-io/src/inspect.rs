//! Single-unit diagnostics: run the pipeline on one archive key and
//! write every intermediate to disk.

use std::path::{Path, PathBuf};

use wedgemesh_export::{DiagnosticOverlay, SvgMetadata, to_boundary_svg, to_diagnostic_svg};
use wedgemesh_pipeline::{PipelineConfig, StagedResult};

use crate::error::IoError;
use crate::fs::{ensure_dir, file_name, file_stem, write_file};
use crate::npz::NpzArchive;
use crate::raster::encode_stage;
use crate::stage::StageId;

/// What `inspect` writes besides the returned staged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InspectOutputs {
    /// One PNG per raster stage.
    pub stages: bool,
    /// Pixel-space diagnostic overlay.
    pub diagnostic_svg: bool,
    /// Physical boundary drawing.
    pub boundary_svg: bool,
}

/// Result of [`inspect_unit`].
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Every intermediate of the run.
    pub staged: StagedResult,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

/// Run the pipeline on `key` of `archive`, writing the requested
/// artifacts to `output_dir` as `<stem>_<key>_<artifact>`.
///
/// # Errors
///
/// Returns [`IoError::Pipeline`] if any stage fails, and filesystem or
/// encoding errors for the artifacts.
pub fn inspect_unit(
    archive: &Path,
    key: &str,
    config: &PipelineConfig,
    output_dir: &Path,
    outputs: InspectOutputs,
) -> Result<Inspection, IoError> {
    let mut npz = NpzArchive::open(archive)?;
    let field = wedgemesh_pipeline::load_field(&mut npz, key)?;
    let staged = wedgemesh_pipeline::process_staged(&field, config)?;

    ensure_dir(output_dir)?;
    let base = format!("{}_{key}", file_stem(archive));
    let title = format!("{} [{key}]", file_name(archive));
    let config_json = serde_json::to_string(config).ok();
    let metadata = SvgMetadata {
        title: Some(&title),
        description: None,
        config_json: config_json.as_deref(),
    };
    let mut written = Vec::new();

    if outputs.stages {
        for stage in StageId::ALL {
            let path = output_dir.join(format!("{base}_{}.png", stage.file_suffix()));
            let png = encode_stage(&staged, stage).map_err(|source| IoError::Image {
                path: path.clone(),
                source,
            })?;
            write_file(&path, png)?;
            written.push(path);
        }
    }

    if outputs.diagnostic_svg {
        let overlay = DiagnosticOverlay::from_staged(&staged, &config.scale)?;
        let path = output_dir.join(format!("{base}_diagnostic.svg"));
        write_file(&path, to_diagnostic_svg(&overlay, &metadata))?;
        written.push(path);
    }

    if outputs.boundary_svg {
        let path = output_dir.join(format!("{base}_boundary.svg"));
        write_file(&path, to_boundary_svg(staged.ordered.points(), &metadata))?;
        written.push(path);
    }

    tracing::info!(
        archive = %file_name(archive),
        key,
        components = staged.component_count,
        contour = staged.contour.len(),
        approximated = staged.approximated.len(),
        points = staged.ordered.len(),
        "inspected"
    );

    Ok(Inspection { staged, written })
}
