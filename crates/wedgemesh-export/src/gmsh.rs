//! Gmsh `.geo` script output.
//!
//! [`GeoScript`] implements [`MeshBuilder`], so the pipeline's
//! [`build_boundary_mesh`](wedgemesh_pipeline::build_boundary_mesh)
//! drives it directly. The finished script meshes the surface in 2-D
//! when run through `gmsh <file>.geo -2`.

use std::fmt::Write;

use wedgemesh_pipeline::mesh::{MeshBuilder, MeshTopology, build_boundary_mesh};
use wedgemesh_pipeline::{PipelineError, Point};

/// Accumulates Gmsh geometry statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoScript {
    text: String,
}

impl GeoScript {
    /// An empty script.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    /// Append a `//` comment line.
    pub fn comment(&mut self, text: &str) {
        let _ = writeln!(self.text, "// {text}");
    }

    /// The statements emitted so far, without the mesh command.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Complete the script with the 2-D mesh command.
    #[must_use = "returns the finished script"]
    pub fn finish(mut self) -> String {
        self.text.push_str("Mesh 2;\n");
        self.text
    }
}

fn join(tags: &[usize]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl MeshBuilder for GeoScript {
    fn add_point(&mut self, tag: usize, point: Point) {
        let _ = writeln!(self.text, "Point({tag}) = {{{}, {}, 0}};", point.x, point.y);
    }

    fn add_line(&mut self, tag: usize, start: usize, end: usize) {
        let _ = writeln!(self.text, "Line({tag}) = {{{start}, {end}}};");
    }

    fn add_curve_loop(&mut self, tag: usize, curves: &[usize]) {
        let _ = writeln!(self.text, "Curve Loop({tag}) = {{{}}};", join(curves));
    }

    fn add_plane_surface(&mut self, tag: usize, curve_loop: usize) {
        let _ = writeln!(self.text, "Plane Surface({tag}) = {{{curve_loop}}};");
    }

    fn add_physical_curve(&mut self, tag: usize, name: &str, curves: &[usize]) {
        let _ = writeln!(
            self.text,
            "Physical Curve(\"{name}\", {tag}) = {{{}}};",
            join(curves)
        );
    }

    fn set_transfinite_curve(&mut self, curve: usize, nodes: u32) {
        let _ = writeln!(self.text, "Transfinite Curve {{{curve}}} = {nodes};");
    }

    fn set_transfinite_surface(&mut self, surface: usize, corners: [usize; 4]) {
        let _ = writeln!(
            self.text,
            "Transfinite Surface {{{surface}}} = {{{}}};",
            join(&corners)
        );
    }

    fn set_recombine(&mut self, surface: usize) {
        let _ = writeln!(self.text, "Recombine Surface {{{surface}}};");
    }

    fn set_mesh_option(&mut self, name: &str, value: f64) {
        let _ = writeln!(self.text, "{name} = {value};");
    }
}

/// Render the complete `.geo` script for an ordered boundary.
///
/// `title` is written as a leading comment (typically the source
/// filename).
///
/// # Errors
///
/// Returns [`PipelineError::PointCountMismatch`] if `points` does not
/// match the topology's vertex count.
pub fn to_geo(
    points: &[Point],
    topology: &MeshTopology,
    title: Option<&str>,
) -> Result<String, PipelineError> {
    let mut script = GeoScript::new();
    if let Some(title) = title {
        script.comment(title);
    }
    build_boundary_mesh(points, topology, &mut script)?;
    Ok(script.finish())
}
