//! Canonical ordering of the physical boundary points.
//!
//! Mesh topology is expressed by position in the list (edge `i` joins
//! point `i` to point `i + 1`), so the order has to be deterministic
//! and traverse the boundary once. Two strategies are available:
//!
//! - [`OrderingPolicy::AngularClockwise`] sorts by angle around the
//!   centroid, decreasing, and rotates the list to start at the
//!   top-left point. Correct for star-shaped outlines, which covers
//!   every wedge and ramp the pipeline targets.
//! - [`OrderingPolicy::WedgeSpecial`] pins the top-left, bottom-right
//!   and bottom-left corners and sorts the rest by x.
//!
//! The result can be checked for self-intersection, which catches
//! concave outlines that angular sorting folds over itself.
//!
//! This is step 8 in the pipeline.

use std::cmp::Ordering;

use geo::Line;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use serde::{Deserialize, Serialize};

use crate::types::{OrderedPointList, PipelineError, Point};

/// Strategy for ordering boundary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Clockwise by angle around the centroid.
    #[default]
    AngularClockwise,

    /// Top-left, then the rest by increasing x, then bottom-right and
    /// bottom-left.
    WedgeSpecial,
}

/// Parameters for the ordering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Ordering strategy.
    pub policy: OrderingPolicy,

    /// Reject orderings whose edges cross.
    pub validate_simple: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            policy: OrderingPolicy::default(),
            validate_simple: true,
        }
    }
}

/// Order `points` per `config`.
///
/// # Errors
///
/// Returns [`PipelineError::SelfIntersecting`] if validation is enabled
/// and the ordered boundary crosses itself.
pub fn order_points(
    points: &[Point],
    config: &OrderConfig,
) -> Result<OrderedPointList, PipelineError> {
    let ordered = match config.policy {
        OrderingPolicy::AngularClockwise => order_clockwise(points),
        OrderingPolicy::WedgeSpecial => order_wedge(points),
    };
    if config.validate_simple {
        validate_simple(&ordered)?;
    }
    Ok(OrderedPointList::new(ordered))
}

/// Remove exact duplicates, keeping the first occurrence.
#[must_use]
pub fn dedup_points(points: &[Point]) -> Vec<Point> {
    let mut unique: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if !unique.contains(&p) {
            unique.push(p);
        }
    }
    unique
}

/// Compare by x ascending, then y descending.
fn left_then_top(a: &Point, b: &Point) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| b.y.total_cmp(&a.y))
}

/// The top-left point: minimum x, maximum y among ties.
fn top_left(points: &[Point]) -> Option<Point> {
    points.iter().copied().min_by(left_then_top)
}

/// Clockwise order around the centroid, starting at the top-left point.
///
/// Duplicates are removed first. Points at equal angles keep their
/// input order.
#[must_use = "returns the ordered points"]
pub fn order_clockwise(points: &[Point]) -> Vec<Point> {
    let mut unique = dedup_points(points);
    let Some(start) = top_left(&unique) else {
        return unique;
    };

    #[allow(clippy::cast_precision_loss)]
    let n = unique.len() as f64;
    let cx = unique.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = unique.iter().map(|p| p.y).sum::<f64>() / n;
    let angle = |p: &Point| (p.y - cy).atan2(p.x - cx);

    unique.sort_by(|a, b| angle(b).total_cmp(&angle(a)));

    if let Some(pos) = unique.iter().position(|p| *p == start) {
        unique.rotate_left(pos);
    }
    unique
}

/// Wedge ordering: top-left, the remaining points by increasing x,
/// bottom-right, bottom-left.
///
/// Bottom-right is the maximum-x point (minimum y among ties) and
/// bottom-left the minimum-x point (minimum y among ties). When these
/// coincide with each other or with the top-left point, each point
/// appears once.
#[must_use = "returns the ordered points"]
pub fn order_wedge(points: &[Point]) -> Vec<Point> {
    let unique = dedup_points(points);
    let Some(first) = top_left(&unique) else {
        return unique;
    };
    let Some(&last) = unique
        .iter()
        .min_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)))
    else {
        return unique;
    };
    let Some(&second_last) = unique
        .iter()
        .max_by(|a, b| a.x.total_cmp(&b.x).then_with(|| b.y.total_cmp(&a.y)))
    else {
        return unique;
    };

    let pinned = [first, second_last, last];
    let mut middle: Vec<Point> = unique
        .iter()
        .copied()
        .filter(|p| !pinned.contains(p))
        .collect();
    middle.sort_by(left_then_top);

    let mut ordered = Vec::with_capacity(unique.len());
    ordered.push(first);
    ordered.extend(middle);
    ordered.push(second_last);
    ordered.push(last);
    dedup_points(&ordered)
}

/// Check that the closed polygon through `points` is simple.
///
/// Non-adjacent edges must not touch; adjacent edges may share only
/// their common vertex. Fewer than three points is never rejected.
///
/// # Errors
///
/// Returns [`PipelineError::SelfIntersecting`] naming the first
/// offending pair of edges (1-based; edge `i` starts at point `i`).
pub fn validate_simple(points: &[Point]) -> Result<(), PipelineError> {
    let n = points.len();
    if n < 3 {
        return Ok(());
    }
    let edge = |i: usize| {
        let a = points[i];
        let b = points[(i + 1) % n];
        Line::new((a.x, a.y), (b.x, b.y))
    };

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            let hit = line_intersection(edge(i), edge(j));
            let bad = match hit {
                None => false,
                Some(LineIntersection::Collinear { .. }) => true,
                Some(LineIntersection::SinglePoint { .. }) => !adjacent,
            };
            if bad {
                return Err(PipelineError::SelfIntersecting {
                    first: i + 1,
                    second: j + 1,
                });
            }
        }
    }
    Ok(())
}
