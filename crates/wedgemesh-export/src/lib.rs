//! wedgemesh-export: Pure format serializers (sans-IO)
//!
//! Converts pipeline output into the artifacts downstream tools
//! consume: `.npy` point lists, Gmsh `.geo` scripts, SU2 sweep
//! configurations with their SLURM job scripts, and SVG drawings.
//! Every function returns bytes or a `String`; writing them is the
//! caller's job.

pub mod error;
pub mod gmsh;
pub mod points;
pub mod slurm;
pub mod su2;
pub mod svg;

pub use error::ExportError;
pub use gmsh::{GeoScript, to_geo};
pub use points::{from_npy, to_npy};
pub use slurm::{CASE_CONFIG_FILE, SlurmConfig, run_script, submit_all_script, submit_script};
pub use su2::{GasProperties, SweepCase, render_case};
pub use svg::{DiagnosticOverlay, SvgMetadata, to_boundary_svg, to_diagnostic_svg};
