//! Fixed-cardinality normalization of the approximated polygon.
//!
//! The mesh topology needs an exact vertex count, but approximation
//! yields however many vertices the contour's shape warrants. This
//! module forces the count:
//!
//! - **Too few:** add contour points one at a time, each time taking
//!   the candidate whose distance to the nearest already-selected
//!   point is largest (max-min insertion).
//! - **Too many:** keep the first point, then repeatedly keep the
//!   remaining point farthest from the kept set (greedy farthest-point
//!   sampling).
//!
//! Both greedy loops use strict comparisons, so ties always resolve to
//! the earliest candidate and the result is deterministic.
//!
//! This is step 6 in the pipeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::PixelPoint;

/// Whether to synthesize a lower-wall copy of the normalized points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowerWallPolicy {
    /// Use the normalized points as-is.
    Omit,

    /// Append a copy of every point projected onto the floor row (the
    /// left-lower reference pixel's row), doubling the count.
    #[default]
    MirrorToFloor,
}

/// Parameters for count normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Number of points after normalization, before any mirroring.
    pub target_count: usize,

    /// Lower-wall synthesis.
    pub lower_wall: LowerWallPolicy,
}

impl NormalizeConfig {
    /// Default target count.
    pub const DEFAULT_TARGET_COUNT: usize = 6;

    /// Number of points the stage emits, including mirrored ones.
    #[must_use]
    pub const fn output_count(&self) -> usize {
        match self.lower_wall {
            LowerWallPolicy::Omit => self.target_count,
            LowerWallPolicy::MirrorToFloor => self.target_count * 2,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_count: Self::DEFAULT_TARGET_COUNT,
            lower_wall: LowerWallPolicy::default(),
        }
    }
}

/// Remove repeated points, keeping the first occurrence of each.
#[must_use]
pub fn dedup_points(points: &[PixelPoint]) -> Vec<PixelPoint> {
    let mut seen = HashSet::with_capacity(points.len());
    points.iter().copied().filter(|p| seen.insert(*p)).collect()
}

/// Force `points` to exactly `target` distinct points.
///
/// Duplicates are removed first. Missing points are drawn from
/// `contour`; if the contour runs out of distinct candidates, the
/// result may still be short.
#[must_use = "returns the normalized point set"]
pub fn normalize_count(
    points: &[PixelPoint],
    contour: &[PixelPoint],
    target: usize,
) -> Vec<PixelPoint> {
    let mut selected = dedup_points(points);

    if selected.len() < target {
        let added = insert_farthest(&mut selected, contour, target);
        tracing::debug!(added, target, "inserted contour points");
    } else if selected.len() > target {
        let before = selected.len();
        selected = farthest_point_sample(&selected, target);
        tracing::debug!(from = before, target, "pruned points");
    }

    selected
}

/// Grow `selected` to `target` with max-min insertion from `contour`.
///
/// Returns the number of points added.
fn insert_farthest(selected: &mut Vec<PixelPoint>, contour: &[PixelPoint], target: usize) -> usize {
    let present: HashSet<PixelPoint> = selected.iter().copied().collect();
    let mut candidates: Vec<PixelPoint> = dedup_points(contour)
        .into_iter()
        .filter(|p| !present.contains(p))
        .collect();

    // Squared distance from each candidate to its nearest selected point.
    let mut nearest: Vec<u64> = candidates
        .iter()
        .map(|c| {
            selected
                .iter()
                .map(|s| c.distance_squared(*s))
                .min()
                .unwrap_or(u64::MAX)
        })
        .collect();

    let start = selected.len();
    while selected.len() < target && !candidates.is_empty() {
        let best = argmax_first(&nearest);
        let chosen = candidates.remove(best);
        nearest.remove(best);
        for (c, d) in candidates.iter().zip(nearest.iter_mut()) {
            *d = (*d).min(c.distance_squared(chosen));
        }
        selected.push(chosen);
    }
    selected.len() - start
}

/// Greedy farthest-point sampling seeded with the first point.
fn farthest_point_sample(points: &[PixelPoint], target: usize) -> Vec<PixelPoint> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    if target == 0 {
        return Vec::new();
    }

    let mut selected = vec![first];
    let mut remaining = rest.to_vec();
    let mut nearest: Vec<u64> = remaining.iter().map(|p| p.distance_squared(first)).collect();

    while selected.len() < target && !remaining.is_empty() {
        let best = argmax_first(&nearest);
        let chosen = remaining.remove(best);
        nearest.remove(best);
        for (p, d) in remaining.iter().zip(nearest.iter_mut()) {
            *d = (*d).min(p.distance_squared(chosen));
        }
        selected.push(chosen);
    }
    selected
}

/// Index of the first maximum.
fn argmax_first(values: &[u64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// The points followed by a copy of each with its row set to `floor_y`.
#[must_use = "returns the mirrored point set"]
pub fn mirror_to_floor(points: &[PixelPoint], floor_y: u32) -> Vec<PixelPoint> {
    points
        .iter()
        .copied()
        .chain(points.iter().map(|p| PixelPoint::new(p.x, floor_y)))
        .collect()
}

/// How many floor copies [`mirror_to_floor`] would produce that
/// coincide with a point already in the set.
///
/// Points on the floor row and points sharing a column both collide.
/// Ordering removes the repeats, so the boundary ends up short of
/// [`NormalizeConfig::output_count`] by this many points.
#[must_use]
pub fn floor_collisions(points: &[PixelPoint], floor_y: u32) -> usize {
    let mirrored = mirror_to_floor(points, floor_y);
    mirrored.len() - dedup_points(&mirrored).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(x: u32, y: u32) -> PixelPoint {
        PixelPoint::new(x, y)
    }

    #[test]
    fn exact_count_is_untouched() {
        let pts = vec![px(0, 0), px(5, 0), px(5, 5)];
        assert_eq!(normalize_count(&pts, &[], 3), pts);
    }

    #[test]
    fn duplicates_are_removed_before_counting() {
        let pts = vec![px(0, 0), px(5, 0), px(0, 0), px(5, 5)];
        let contour = vec![px(9, 9)];
        let out = normalize_count(&pts, &contour, 4);
        assert_eq!(out, vec![px(0, 0), px(5, 0), px(5, 5), px(9, 9)]);
    }

    #[test]
    fn insertion_preserves_originals_and_picks_farthest() {
        // Unit-square corners scaled by 10, with candidates along the
        // edges. The farthest candidate from every corner is an edge
        // midpoint; the first such in contour order is (5, 0).
        let corners = vec![px(0, 0), px(10, 0), px(10, 10), px(0, 10)];
        let contour: Vec<PixelPoint> = (0..=10)
            .map(|x| px(x, 0))
            .chain((1..=10).map(|y| px(10, y)))
            .chain((0..10).rev().map(|x| px(x, 10)))
            .chain((1..10).rev().map(|y| px(0, y)))
            .collect();

        let out = normalize_count(&corners, &contour, 6);
        assert_eq!(out.len(), 6);
        assert_eq!(&out[..4], &corners[..]);
        assert_eq!(out[4], px(5, 0));
        // After (5,0) joins, the remaining midpoints (10,5), (5,10),
        // (0,5) are all 25 away; (10,5) is first in contour order.
        assert_eq!(out[5], px(10, 5));
    }

    #[test]
    fn insertion_is_deterministic() {
        let pts = vec![px(0, 0), px(20, 0)];
        let contour: Vec<PixelPoint> = (0..=20).map(|x| px(x, x / 2)).collect();
        let a = normalize_count(&pts, &contour, 5);
        let b = normalize_count(&pts, &contour, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn insertion_into_empty_set_seeds_with_first_candidate() {
        let contour = vec![px(3, 3), px(0, 0), px(9, 9)];
        let out = normalize_count(&[], &contour, 2);
        assert_eq!(out, vec![px(3, 3), px(9, 9)]);
    }

    #[test]
    fn insertion_stops_when_contour_exhausted() {
        let pts = vec![px(0, 0)];
        let contour = vec![px(0, 0), px(1, 0)];
        assert_eq!(normalize_count(&pts, &contour, 6), vec![px(0, 0), px(1, 0)]);
    }

    #[test]
    fn pruning_keeps_first_then_farthest() {
        let pts = vec![px(0, 0), px(1, 0), px(10, 0), px(10, 10), px(9, 10), px(0, 10)];
        let out = normalize_count(&pts, &[], 4);
        assert_eq!(out, vec![px(0, 0), px(10, 10), px(10, 0), px(0, 10)]);
    }

    #[test]
    fn pruning_to_one_keeps_first() {
        let pts = vec![px(4, 4), px(0, 0), px(8, 8)];
        assert_eq!(normalize_count(&pts, &[], 1), vec![px(4, 4)]);
    }

    #[test]
    fn mirror_appends_floor_copies() {
        let pts = vec![px(0, 10), px(50, 20)];
        assert_eq!(
            mirror_to_floor(&pts, 90),
            vec![px(0, 10), px(50, 20), px(0, 90), px(50, 90)],
        );
    }

    #[test]
    fn distinct_columns_above_floor_do_not_collide() {
        let pts = vec![px(0, 10), px(50, 20), px(90, 40)];
        assert_eq!(floor_collisions(&pts, 90), 0);
    }

    #[test]
    fn floor_row_points_collide_with_their_copies() {
        // (30, 90) already sits on the floor; (0, 10) and (0, 40) share a column.
        let pts = vec![px(0, 10), px(0, 40), px(30, 90), px(60, 20)];
        assert_eq!(floor_collisions(&pts, 90), 2);
        assert_eq!(
            dedup_points(&mirror_to_floor(&pts, 90)).len(),
            mirror_to_floor(&pts, 90).len() - 2
        );
    }

    #[test]
    fn output_count_doubles_when_mirroring() {
        let config = NormalizeConfig::default();
        assert_eq!(config.output_count(), 12);
        let config = NormalizeConfig {
            lower_wall: LowerWallPolicy::Omit,
            ..config
        };
        assert_eq!(config.output_count(), 6);
    }
}
