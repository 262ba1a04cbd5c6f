//! wedgemesh-io: filesystem side of the wedgemesh pipeline.
//!
//! Reads `.npz` field archives, runs the pipeline over batches of
//! archives and keys, and writes point lists, Gmsh scripts, solver case
//! directories, diagnostic images and error logs.

pub mod batch;
pub mod error;
pub mod error_log;
pub mod fs;
pub mod inspect;
pub mod meshing;
pub mod npz;
pub mod raster;
pub mod stage;
pub mod sweep;

pub use batch::{
    BatchReport, ExtractOptions, ExtractUnit, ExtractedUnit, discover_units, output_name,
    run_extraction,
};
pub use error::IoError;
pub use error_log::{SkippedUnit, write_error_log};
pub use inspect::{InspectOutputs, Inspection, inspect_unit};
pub use meshing::{MeshOptions, MeshedUnit, run_gmsh, run_meshing};
pub use npz::NpzArchive;
pub use stage::StageId;
pub use sweep::{SUBMIT_ALL_FILE, SweepCaseDir, SweepConditions, SweepOptions, run_sweep};
