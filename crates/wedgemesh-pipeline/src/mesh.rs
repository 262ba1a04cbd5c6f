//! Structured 2-D boundary mesh definition.
//!
//! The ordered point list becomes a single plane surface bounded by
//! the polygon through the points. Boundary roles are assigned purely
//! by position:
//!
//! | Curve | Role |
//! |---|---|
//! | `n` (last point back to first) | Inlet |
//! | `n / 2` | Outlet |
//! | all others | Wall |
//!
//! The surface is meshed as a transfinite (structured) quad grid. Its
//! four corners are points `n`, `n/2 + 1`, `n/2` and `1`, so the
//! upper and lower walls face each other and wall curves `i` and
//! `n - i` must carry the same node count.
//!
//! [`MeshBuilder`] is the seam to a concrete mesh generator; the export
//! crate implements it by emitting a Gmsh `.geo` script.

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Point};

/// Receives structured mesh-definition calls.
///
/// Tags are 1-based, as in Gmsh.
pub trait MeshBuilder {
    /// Define point `tag` at `point`.
    fn add_point(&mut self, tag: usize, point: Point);

    /// Define a straight line `tag` from point `start` to point `end`.
    fn add_line(&mut self, tag: usize, start: usize, end: usize);

    /// Define curve loop `tag` through `curves` in order.
    fn add_curve_loop(&mut self, tag: usize, curves: &[usize]);

    /// Define plane surface `tag` bounded by `curve_loop`.
    fn add_plane_surface(&mut self, tag: usize, curve_loop: usize);

    /// Group `curves` under physical tag `tag` with a boundary `name`.
    fn add_physical_curve(&mut self, tag: usize, name: &str, curves: &[usize]);

    /// Place `nodes` nodes uniformly along `curve`.
    fn set_transfinite_curve(&mut self, curve: usize, nodes: u32);

    /// Mesh `surface` as a structured grid with the given corner points.
    fn set_transfinite_surface(&mut self, surface: usize, corners: [usize; 4]);

    /// Combine triangles on `surface` into quadrilaterals.
    fn set_recombine(&mut self, surface: usize);

    /// Set a numeric generator option (e.g. `Mesh.MshFileVersion`).
    fn set_mesh_option(&mut self, name: &str, value: f64);
}

/// Boundary role of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Supersonic inflow boundary.
    Inlet,
    /// Outflow boundary.
    Outlet,
    /// Solid wall.
    Wall,
}

impl BoundaryKind {
    /// Marker name shared by the mesh and the solver config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inlet => "Inlet",
            Self::Outlet => "Outlet",
            Self::Wall => "Wall",
        }
    }

    /// Physical group tag.
    #[must_use]
    pub const fn physical_tag(self) -> usize {
        match self {
            Self::Inlet => 1,
            Self::Outlet => 2,
            Self::Wall => 3,
        }
    }
}

/// Vertex count and per-curve node counts for a structured wedge mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTopology {
    vertex_count: usize,
    inlet_outlet_nodes: u32,
    wall_nodes: Vec<u32>,
}

impl MeshTopology {
    /// Build a topology for `vertex_count` points.
    ///
    /// `wall_nodes[k]` is the node count of wall curves `k + 1` and
    /// `n - k - 1`, so it must hold `n / 2 - 1` entries.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `vertex_count` is odd
    /// or below 4, if `wall_nodes` has the wrong length, or if any node
    /// count is below 2.
    pub fn new(
        vertex_count: usize,
        inlet_outlet_nodes: u32,
        wall_nodes: Vec<u32>,
    ) -> Result<Self, PipelineError> {
        if vertex_count < 4 || vertex_count % 2 != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "mesh vertex count must be even and at least 4, got {vertex_count}"
            )));
        }
        let expected = vertex_count / 2 - 1;
        if wall_nodes.len() != expected {
            return Err(PipelineError::InvalidConfig(format!(
                "{vertex_count} vertices need {expected} wall node counts, got {}",
                wall_nodes.len()
            )));
        }
        if inlet_outlet_nodes < 2 || wall_nodes.iter().any(|&n| n < 2) {
            return Err(PipelineError::InvalidConfig(
                "every curve needs at least 2 nodes".to_string(),
            ));
        }
        Ok(Self {
            vertex_count,
            inlet_outlet_nodes,
            wall_nodes,
        })
    }

    /// Double-ramp preset: 12 vertices (six outline points mirrored to
    /// the floor).
    #[must_use]
    pub fn double_ramp() -> Self {
        Self {
            vertex_count: 12,
            inlet_outlet_nodes: 201,
            wall_nodes: vec![11, 31, 21, 31, 61],
        }
    }

    /// Single-ramp preset: 6 vertices.
    #[must_use]
    pub fn single_ramp() -> Self {
        Self {
            vertex_count: 6,
            inlet_outlet_nodes: 201,
            wall_nodes: vec![101, 51],
        }
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// The inlet curve.
    #[must_use]
    pub const fn inlet(&self) -> usize {
        self.vertex_count
    }

    /// The outlet curve.
    #[must_use]
    pub const fn outlet(&self) -> usize {
        self.vertex_count / 2
    }

    /// Boundary role of curve `curve` (1-based).
    #[must_use]
    pub const fn boundary(&self, curve: usize) -> BoundaryKind {
        if curve == self.inlet() {
            BoundaryKind::Inlet
        } else if curve == self.outlet() {
            BoundaryKind::Outlet
        } else {
            BoundaryKind::Wall
        }
    }

    /// Wall curves in increasing order.
    #[must_use]
    pub fn walls(&self) -> Vec<usize> {
        (1..=self.vertex_count)
            .filter(|&c| self.boundary(c) == BoundaryKind::Wall)
            .collect()
    }

    /// Node count of curve `curve` (1-based).
    #[must_use]
    pub fn nodes(&self, curve: usize) -> u32 {
        let half = self.vertex_count / 2;
        if curve == self.inlet() || curve == self.outlet() {
            return self.inlet_outlet_nodes;
        }
        let k = if curve < half {
            curve
        } else {
            self.vertex_count - curve
        };
        self.wall_nodes
            .get(k.saturating_sub(1))
            .copied()
            .unwrap_or(self.inlet_outlet_nodes)
    }

    /// Transfinite surface corners.
    #[must_use]
    pub const fn corners(&self) -> [usize; 4] {
        let n = self.vertex_count;
        [n, n / 2 + 1, n / 2, 1]
    }
}

impl Default for MeshTopology {
    fn default() -> Self {
        Self::double_ramp()
    }
}

/// Drive `builder` through the full boundary-mesh definition for
/// `points`.
///
/// Emits, in order: points, lines, the curve loop (starting with the
/// inlet), the plane surface, physical groups (Inlet, Outlet, Wall),
/// transfinite curves and surface, recombination, and output options
/// (MSH 2.2, save all elements).
///
/// # Errors
///
/// Returns [`PipelineError::PointCountMismatch`] before emitting
/// anything if `points.len()` differs from the topology's vertex count.
pub fn build_boundary_mesh<B: MeshBuilder + ?Sized>(
    points: &[Point],
    topology: &MeshTopology,
    builder: &mut B,
) -> Result<(), PipelineError> {
    let n = topology.vertex_count();
    if points.len() != n {
        return Err(PipelineError::PointCountMismatch {
            expected: n,
            actual: points.len(),
        });
    }

    for (i, &p) in points.iter().enumerate() {
        builder.add_point(i + 1, p);
    }
    for i in 1..=n {
        builder.add_line(i, i, i % n + 1);
    }

    let curve_loop: Vec<usize> = std::iter::once(n).chain(1..n).collect();
    builder.add_curve_loop(1, &curve_loop);
    builder.add_plane_surface(1, 1);

    let groups = [
        (BoundaryKind::Inlet, vec![topology.inlet()]),
        (BoundaryKind::Outlet, vec![topology.outlet()]),
        (BoundaryKind::Wall, topology.walls()),
    ];
    for (kind, curves) in &groups {
        builder.add_physical_curve(kind.physical_tag(), kind.name(), curves);
    }

    builder.set_transfinite_surface(1, topology.corners());
    for curve in 1..=n {
        builder.set_transfinite_curve(curve, topology.nodes(curve));
    }
    builder.set_recombine(1);

    builder.set_mesh_option("Mesh.MshFileVersion", 2.2);
    builder.set_mesh_option("Mesh.SaveAll", 1.0);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Records every call for inspection.
    #[derive(Default)]
    struct Recorder {
        points: Vec<(usize, Point)>,
        lines: Vec<(usize, usize, usize)>,
        loops: Vec<Vec<usize>>,
        physical: Vec<(usize, String, Vec<usize>)>,
        transfinite: Vec<(usize, u32)>,
        corners: Option<[usize; 4]>,
        recombined: bool,
        options: Vec<(String, f64)>,
    }

    impl MeshBuilder for Recorder {
        fn add_point(&mut self, tag: usize, point: Point) {
            self.points.push((tag, point));
        }
        fn add_line(&mut self, tag: usize, start: usize, end: usize) {
            self.lines.push((tag, start, end));
        }
        fn add_curve_loop(&mut self, _tag: usize, curves: &[usize]) {
            self.loops.push(curves.to_vec());
        }
        fn add_plane_surface(&mut self, _tag: usize, _curve_loop: usize) {}
        fn add_physical_curve(&mut self, tag: usize, name: &str, curves: &[usize]) {
            self.physical.push((tag, name.to_string(), curves.to_vec()));
        }
        fn set_transfinite_curve(&mut self, curve: usize, nodes: u32) {
            self.transfinite.push((curve, nodes));
        }
        fn set_transfinite_surface(&mut self, _surface: usize, corners: [usize; 4]) {
            self.corners = Some(corners);
        }
        fn set_recombine(&mut self, _surface: usize) {
            self.recombined = true;
        }
        fn set_mesh_option(&mut self, name: &str, value: f64) {
            self.options.push((name.to_string(), value));
        }
    }

    fn points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64;
                Point::new(x, 0.0)
            })
            .collect()
    }

    #[test]
    fn double_ramp_matches_reference_layout() {
        let mut rec = Recorder::default();
        build_boundary_mesh(&points(12), &MeshTopology::double_ramp(), &mut rec).unwrap();

        assert_eq!(rec.points.len(), 12);
        assert_eq!(rec.lines[0], (1, 1, 2));
        assert_eq!(rec.lines[11], (12, 12, 1));
        assert_eq!(rec.loops, vec![vec![12, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]]);
        assert_eq!(rec.corners, Some([12, 7, 6, 1]));
        assert_eq!(
            rec.physical,
            vec![
                (1, "Inlet".to_string(), vec![12]),
                (2, "Outlet".to_string(), vec![6]),
                (3, "Wall".to_string(), vec![1, 2, 3, 4, 5, 7, 8, 9, 10, 11]),
            ],
        );
        assert!(rec.recombined);
        assert!(rec.options.contains(&("Mesh.MshFileVersion".to_string(), 2.2)));
    }

    #[test]
    fn double_ramp_node_counts() {
        let topo = MeshTopology::double_ramp();
        let expected = [
            (1, 11),
            (2, 31),
            (3, 21),
            (4, 31),
            (5, 61),
            (6, 201),
            (7, 61),
            (8, 31),
            (9, 21),
            (10, 31),
            (11, 11),
            (12, 201),
        ];
        for (curve, nodes) in expected {
            assert_eq!(topo.nodes(curve), nodes, "curve {curve}");
        }
    }

    #[test]
    fn opposite_walls_share_node_counts() {
        for topo in [MeshTopology::double_ramp(), MeshTopology::single_ramp()] {
            let n = topo.vertex_count();
            for i in 1..n / 2 {
                assert_eq!(topo.nodes(i), topo.nodes(n - i));
            }
        }
    }

    #[test]
    fn wrong_point_count_emits_nothing() {
        let mut rec = Recorder::default();
        let err = build_boundary_mesh(&points(11), &MeshTopology::double_ramp(), &mut rec)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PointCountMismatch {
                expected: 12,
                actual: 11
            }
        ));
        assert!(rec.points.is_empty());
        assert!(rec.lines.is_empty());
    }

    #[test]
    fn single_ramp_roles() {
        let topo = MeshTopology::single_ramp();
        assert_eq!(topo.inlet(), 6);
        assert_eq!(topo.outlet(), 3);
        assert_eq!(topo.walls(), vec![1, 2, 4, 5]);
        assert_eq!(topo.corners(), [6, 4, 3, 1]);
    }

    #[test]
    fn custom_topology_validation() {
        assert!(MeshTopology::new(8, 101, vec![11, 21, 31]).is_ok());
        assert!(MeshTopology::new(7, 101, vec![11, 21]).is_err());
        assert!(MeshTopology::new(8, 101, vec![11, 21]).is_err());
        assert!(MeshTopology::new(8, 1, vec![11, 21, 31]).is_err());
        assert!(MeshTopology::new(2, 101, vec![]).is_err());
    }

    #[test]
    fn topology_serde_round_trip() {
        let topo = MeshTopology::double_ramp();
        let json = serde_json::to_string(&topo).unwrap();
        let back: MeshTopology = serde_json::from_str(&json).unwrap();
        assert_eq!(topo, back);
    }
}
