//! Contour tracing: outer borders of top-level mask components.
//!
//! Uses Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`] and keeps only outer borders
//! without a parent, i.e. the external outline of each component.
//! Holes and components nested inside holes are ignored.

use geo::{Area, LineString, Polygon};
use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::PixelPoint;

/// A closed pixel-coordinate outline.
///
/// The last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<PixelPoint>,
}

impl Contour {
    /// Wrap a closed sequence of pixel coordinates.
    #[must_use]
    pub const fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    /// The outline's points in traversal order.
    #[must_use]
    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    /// Number of points on the outline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the outline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consumes the contour and returns its points.
    #[must_use]
    pub fn into_points(self) -> Vec<PixelPoint> {
        self.points
    }

    /// Enclosed area by the shoelace formula.
    #[must_use]
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let ring: LineString<f64> = self
            .points
            .iter()
            .map(|p| (f64::from(p.x), f64::from(p.y)))
            .collect();
        Polygon::new(ring, Vec::new()).unsigned_area()
    }

    /// Closed arc length, including the edge from the last point back
    /// to the first.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i].to_point();
                let b = self.points[(i + 1) % n].to_point();
                a.distance(b)
            })
            .sum()
    }
}

/// Trace the outer border of every top-level foreground component.
///
/// Any non-zero pixel counts as foreground.
#[must_use = "returns the traced components"]
pub fn extract_components(mask: &GrayImage) -> Vec<Contour> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(mask);

    contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| PixelPoint::new(p.x, p.y))
                    .collect(),
            )
        })
        .collect()
}

/// The component with the largest enclosed area.
///
/// Ties keep the earliest component. Components with zero area (lines
/// and isolated pixels) are never selected; returns `None` when nothing
/// else remains.
#[must_use]
pub fn largest_component(components: Vec<Contour>) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for contour in components {
        let area = contour.area();
        if area <= 0.0 {
            continue;
        }
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, contour));
        }
    }
    best.map(|(_, contour)| contour)
}
