//! Shared types for the wedgemesh extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::approximate::ApproximationConfig;
use crate::corners::ReferenceConfig;
use crate::mask::MaskConfig;
use crate::normalize::NormalizeConfig;
use crate::order::OrderConfig;
use crate::render::Colormap;
use crate::scale::ScaleConfig;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage`, the rendered field raster.
pub use image::RgbImage;

/// A 2D point in physical domain coordinates (+Y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An integer pixel coordinate: column `x`, row `y`, origin at the
/// top-left corner of the raster (+Y down).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PixelPoint {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl PixelPoint {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Exact squared distance to another pixel.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        dx * dx + dy * dy
    }

    /// The same coordinate as a floating-point [`Point`] in pixel space.
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The three foreground pixels that anchor the pixel-to-physical
/// transform.
///
/// Each is the single pixel extremizing a linear functional over the
/// foreground set:
///
/// | Pixel | Functional |
/// |---|---|
/// | `left_upper` | minimum `x + y` |
/// | `left_lower` | minimum `x - y` |
/// | `right_lower` | maximum `x + y` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePixels {
    /// Top-left extreme.
    pub left_upper: PixelPoint,
    /// Bottom-left extreme. Origin of the physical coordinate system.
    pub left_lower: PixelPoint,
    /// Bottom-right extreme.
    pub right_lower: PixelPoint,
}

impl ReferencePixels {
    /// The three pixels in `[left_upper, left_lower, right_lower]` order.
    #[must_use]
    pub const fn to_array(self) -> [PixelPoint; 3] {
        [self.left_upper, self.left_lower, self.right_lower]
    }
}

/// The final boundary: physical points without duplicates, in clockwise
/// order from the canonical start point.
///
/// Order is the payload; consumers must not re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedPointList(Vec<Point>);

impl OrderedPointList {
    /// Wrap an already-ordered sequence.
    ///
    /// No ordering is applied here; use [`crate::order::order_points`]
    /// to build a canonical list from an unordered set.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the list has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the list.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the list and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Configuration for the extraction pipeline.
///
/// Every stage reads its own sub-configuration; nothing is global.
/// Missing fields deserialize to their defaults so partial JSON
/// configs are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Colormap used to rasterize the scalar field.
    pub colormap: Colormap,

    /// Denoising and thresholding.
    pub mask: MaskConfig,

    /// Reference-pixel detection.
    pub references: ReferenceConfig,

    /// Polygon simplification and corrective heuristics.
    pub approximation: ApproximationConfig,

    /// Fixed-cardinality normalization.
    pub normalize: NormalizeConfig,

    /// Pixel-to-physical transform.
    pub scale: ScaleConfig,

    /// Final point ordering.
    pub order: OrderConfig,
}

impl PipelineConfig {
    /// Check the invariants that stages rely on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.normalize.target_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "normalize.target_count must be at least 1".to_string(),
            ));
        }
        if !(self.scale.domain_height.is_finite() && self.scale.domain_height > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "scale.domain_height must be positive, got {}",
                self.scale.domain_height,
            )));
        }
        if !(self.approximation.epsilon_factor.is_finite()
            && self.approximation.epsilon_factor >= 0.0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "approximation.epsilon_factor must be non-negative, got {}",
                self.approximation.epsilon_factor,
            )));
        }
        Ok(())
    }

    /// Number of points the ordered list is expected to contain.
    #[must_use]
    pub const fn expected_point_count(&self) -> usize {
        self.normalize.output_count()
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// The ordered physical boundary.
    pub points: OrderedPointList,

    /// Reference pixels that defined the transform.
    pub references: ReferencePixels,

    /// Dimensions of the rendered raster in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
///
/// Used by diagnostics (`inspect`) to visualize each stage.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: rendered field raster.
    pub raster: RgbImage,
    /// Stage 2: denoised single-channel intensity.
    pub intensity: GrayImage,
    /// Stage 3: binary mask (255 = wedge foreground).
    pub mask: GrayImage,
    /// Stage 3: number of top-level components found in the mask.
    pub component_count: usize,
    /// Stage 3: dominant contour.
    pub contour: crate::contour::Contour,
    /// Stage 4: reference pixels.
    pub references: ReferencePixels,
    /// Stage 5: approximated polygon after corrective heuristics.
    pub approximated: Vec<PixelPoint>,
    /// Stage 6: fixed-cardinality raw point set (including any
    /// mirrored floor points).
    pub normalized: Vec<PixelPoint>,
    /// Stage 7: physical points, unordered.
    pub physical: Vec<Point>,
    /// Stage 8: ordered boundary.
    pub ordered: OrderedPointList,
    /// Raster dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Drop the intermediates and keep only the final output.
    #[must_use]
    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            points: self.ordered,
            references: self.references,
            dimensions: self.dimensions,
        }
    }
}

/// Image axis named in [`PipelineError::DegenerateScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
        }
    }
}

/// Errors that can occur while extracting geometry from a field.
///
/// All of these are per-unit failures: the orchestrator logs them and
/// moves on to the next (file, key) pair. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The requested data key is absent from the archive.
    #[error("field '{key}' not found; available keys: [{}]", .available.join(", "))]
    MissingFieldKey {
        /// Requested key.
        key: String,
        /// Keys the archive does contain.
        available: Vec<String>,
    },

    /// The archive holds the key but the array could not be read.
    #[error("failed to read field '{key}': {message}")]
    Archive {
        /// Requested key.
        key: String,
        /// Underlying reader message.
        message: String,
    },

    /// The array is not a usable 2-D field.
    #[error("field '{key}' is not usable: {reason}")]
    InvalidField {
        /// Field key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Thresholding produced no foreground component with area.
    #[error("no foreground contour found in the mask")]
    NoContourFound,

    /// Reference pixels span zero or negative pixels on an axis.
    #[error("degenerate scale: reference pixels span {extent} px along {axis}")]
    DegenerateScale {
        /// Axis whose denominator vanished.
        axis: Axis,
        /// Signed pixel extent that was used as the denominator.
        extent: i64,
    },

    /// The ordered list does not match the mesh topology.
    #[error("expected {expected} points, got {actual}")]
    PointCountMismatch {
        /// Vertex count of the topology.
        expected: usize,
        /// Length of the ordered list.
        actual: usize,
    },

    /// The ordered boundary crosses itself.
    #[error("boundary edges {first} and {second} intersect")]
    SelfIntersecting {
        /// 1-based index of the first edge.
        first: usize,
        /// 1-based index of the second edge.
        second: usize,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Short stable identifier for error logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingFieldKey { .. } => "missing_field_key",
            Self::Archive { .. } => "archive",
            Self::InvalidField { .. } => "invalid_field",
            Self::NoContourFound => "no_contour_found",
            Self::DegenerateScale { .. } => "degenerate_scale",
            Self::PointCountMismatch { .. } => "point_count_mismatch",
            Self::SelfIntersecting { .. } => "self_intersecting",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}
