//! Polygon approximation of the wedge contour.
//!
//! The traced contour has one point per boundary pixel. It is reduced
//! to a handful of vertices with the Ramer-Douglas-Peucker algorithm,
//! applied to a closed ring, with a tolerance proportional to the
//! contour's perimeter. Two corrective heuristics then clean up
//! artifacts that rasterization leaves on wedge outlines:
//!
//! - **Left-wall alignment.** The inlet wall is vertical, but the two
//!   leftmost vertices often differ by a pixel in x. The second-leftmost
//!   vertex is moved onto the leftmost vertex's row so the wall stays
//!   straight after scaling.
//! - **Top-right duplicate removal.** The outlet's top corner is often
//!   split into two near-coincident vertices. See [`CornerPolicy`].
//!
//! This is step 5 in the pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::types::{PixelPoint, Point};

/// How to treat clustered vertices near the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerPolicy {
    /// Leave the approximated vertices alone.
    Keep,

    /// Among vertices within the x tolerance of the rightmost one, drop
    /// those sitting on the topmost row of the cluster, but only when
    /// the cluster holds more than one vertex.
    #[default]
    DropDuplicateTopRight,
}

/// Parameters for polygon approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximationConfig {
    /// RDP tolerance as a fraction of the contour's perimeter.
    pub epsilon_factor: f64,

    /// Snap the second-leftmost vertex onto the leftmost vertex's row.
    pub align_left_wall: bool,

    /// Top-right corner clean-up.
    pub corner_policy: CornerPolicy,

    /// Horizontal distance from the rightmost vertex, in pixels, within
    /// which vertices count as part of the right-edge cluster.
    pub corner_x_tolerance: u32,
}

impl ApproximationConfig {
    /// Default RDP tolerance factor.
    pub const DEFAULT_EPSILON_FACTOR: f64 = 0.0025;

    /// Default right-edge cluster width in pixels.
    pub const DEFAULT_CORNER_X_TOLERANCE: u32 = 10;
}

impl Default for ApproximationConfig {
    fn default() -> Self {
        Self {
            epsilon_factor: Self::DEFAULT_EPSILON_FACTOR,
            align_left_wall: true,
            corner_policy: CornerPolicy::default(),
            corner_x_tolerance: Self::DEFAULT_CORNER_X_TOLERANCE,
        }
    }
}

/// Approximate `contour` and apply the configured heuristics.
#[must_use = "returns the approximated vertices"]
pub fn approximate(contour: &Contour, config: &ApproximationConfig) -> Vec<PixelPoint> {
    let tolerance = config.epsilon_factor * contour.perimeter();
    let mut vertices = simplify_closed(contour.points(), tolerance);
    tracing::debug!(
        tolerance,
        from = contour.len(),
        to = vertices.len(),
        "approximated contour"
    );

    if config.align_left_wall && align_left_wall(&mut vertices) {
        tracing::debug!("aligned left wall");
    }

    if config.corner_policy == CornerPolicy::DropDuplicateTopRight {
        let removed = drop_duplicate_top_right(&mut vertices, config.corner_x_tolerance);
        if removed > 0 {
            tracing::debug!(removed, "dropped duplicate top-right vertices");
        }
    }

    vertices
}

/// Simplify a closed ring with the Ramer-Douglas-Peucker algorithm.
///
/// The ring is split at two well-separated anchors: the point farthest
/// from the first point, and the point farthest from that one. Each
/// half is simplified as an open chain and the halves are rejoined, so
/// the result does not depend on where tracing happened to start.
/// Output vertices keep the ring's traversal order, starting from the
/// earlier anchor.
///
/// Rings with fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified ring"]
pub fn simplify_closed(points: &[PixelPoint], tolerance: f64) -> Vec<PixelPoint> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        // Every point coincides with the first.
        return vec![points[0]];
    }
    let (start, end) = if a < b { (a, b) } else { (b, a) };

    let ring: Vec<Point> = points.iter().map(|p| p.to_point()).collect();

    // First chain: start..=end. Second chain wraps: end..n, 0..=start.
    let first: Vec<usize> = (start..=end).collect();
    let second: Vec<usize> = (end..n).chain(0..=start).collect();

    let mut kept = Vec::new();
    for chain in [&first, &second] {
        let chain_points: Vec<Point> = chain.iter().map(|&i| ring[i]).collect();
        let mut keep = vec![false; chain.len()];
        keep[0] = true;
        rdp_recurse(&chain_points, 0, chain.len() - 1, tolerance, &mut keep);
        // Skip the chain's last point: it starts the next chain.
        kept.extend(
            chain
                .iter()
                .zip(&keep)
                .take(chain.len() - 1)
                .filter(|&(_, k)| *k)
                .map(|(&i, _)| points[i]),
        );
    }

    kept
}

/// Index of the first point farthest from `origin`.
fn farthest_from(points: &[PixelPoint], origin: PixelPoint) -> usize {
    let mut best = 0;
    let mut best_dist = 0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared(origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

/// Move the second-leftmost vertex onto the leftmost vertex's row.
///
/// Ranks vertices by x with a stable sort (ties keep input order).
/// Returns `true` if a vertex moved. Fewer than two vertices is a no-op.
pub fn align_left_wall(points: &mut [PixelPoint]) -> bool {
    if points.len() < 2 {
        return false;
    }
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i].x);
    let (leftmost, second) = (order[0], order[1]);

    let y = points[leftmost].y;
    if points[second].y == y {
        return false;
    }
    points[second].y = y;
    true
}

/// Remove the topmost vertices of the right-edge cluster.
///
/// The cluster is every vertex with `x >= max_x - x_tolerance`. When it
/// holds more than one vertex, all cluster vertices whose y equals the
/// cluster's minimum y are removed. Returns the number removed.
pub fn drop_duplicate_top_right(points: &mut Vec<PixelPoint>, x_tolerance: u32) -> usize {
    let Some(max_x) = points.iter().map(|p| p.x).max() else {
        return 0;
    };
    let cutoff = max_x.saturating_sub(x_tolerance);
    let in_cluster = |p: &PixelPoint| p.x >= cutoff;

    let cluster_size = points.iter().filter(|p| in_cluster(p)).count();
    if cluster_size <= 1 {
        return 0;
    }
    let Some(top) = points.iter().filter(|p| in_cluster(p)).map(|p| p.y).min() else {
        return 0;
    };

    let before = points.len();
    points.retain(|p| !(in_cluster(p) && p.y == top));
    before - points.len()
}
