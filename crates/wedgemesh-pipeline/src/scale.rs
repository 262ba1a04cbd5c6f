//! Pixel-to-physical coordinate transform.
//!
//! Converts pixel-space points into the simulation's physical
//! coordinate system, anchored at the left-lower reference pixel:
//!
//! ```text
//! x_phys = (pixel_x - left_lower.x) × scale_x
//! y_phys = (left_lower.y - pixel_y) × scale_y
//! ```
//!
//! The Y-axis is **flipped** so that physical space uses the
//! mathematical convention of +Y pointing upward. `scale_y` maps the
//! reference pixels' vertical extent (left-upper to left-lower) onto
//! the configured domain height. `scale_x` either reuses `scale_y`
//! (isotropic) or maps the horizontal extent (left-lower to
//! right-lower) onto the same height (anisotropic).
//!
//! This is step 7 in the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::{Axis, PipelineError, PixelPoint, Point, ReferencePixels};

/// How the horizontal scale factor is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// `scale_x = scale_y`. Preserves the raster's aspect ratio.
    #[default]
    Isotropic,

    /// `scale_x = domain_height / (right_lower.x - left_lower.x)`.
    Anisotropic,
}

/// Parameters for the physical transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Physical height spanned by the reference pixels' vertical extent.
    pub domain_height: f64,

    /// Horizontal scale derivation.
    pub policy: ScalingPolicy,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            domain_height: 1.0,
            policy: ScalingPolicy::default(),
        }
    }
}

/// An affine, invertible pixel-to-physical transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalScaler {
    origin: PixelPoint,
    scale_x: f64,
    scale_y: f64,
}

impl PhysicalScaler {
    /// Build the transform from the reference pixels.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateScale`] if the vertical extent
    /// `left_lower.y - left_upper.y` is not positive, or, under
    /// [`ScalingPolicy::Anisotropic`], if the horizontal extent
    /// `right_lower.x - left_lower.x` is not positive.
    pub fn new(references: &ReferencePixels, config: &ScaleConfig) -> Result<Self, PipelineError> {
        let height_px = i64::from(references.left_lower.y) - i64::from(references.left_upper.y);
        if height_px <= 0 {
            return Err(PipelineError::DegenerateScale {
                axis: Axis::Y,
                extent: height_px,
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let scale_y = config.domain_height / height_px as f64;

        let scale_x = match config.policy {
            ScalingPolicy::Isotropic => scale_y,
            ScalingPolicy::Anisotropic => {
                let width_px =
                    i64::from(references.right_lower.x) - i64::from(references.left_lower.x);
                if width_px <= 0 {
                    return Err(PipelineError::DegenerateScale {
                        axis: Axis::X,
                        extent: width_px,
                    });
                }
                #[allow(clippy::cast_precision_loss)]
                let scale_x = config.domain_height / width_px as f64;
                scale_x
            }
        };

        tracing::debug!(scale_x, scale_y, policy = ?config.policy, "built physical scaler");

        Ok(Self {
            origin: references.left_lower,
            scale_x,
            scale_y,
        })
    }

    /// Physical units per horizontal pixel.
    #[must_use]
    pub const fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Physical units per vertical pixel.
    #[must_use]
    pub const fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// The pixel that maps to the physical origin.
    #[must_use]
    pub const fn origin(&self) -> PixelPoint {
        self.origin
    }

    /// Map a pixel coordinate to physical space.
    #[must_use]
    pub fn to_physical(&self, p: PixelPoint) -> Point {
        self.to_physical_f64(p.to_point())
    }

    /// Map a fractional pixel coordinate to physical space.
    #[must_use]
    pub fn to_physical_f64(&self, p: Point) -> Point {
        let origin = self.origin.to_point();
        Point::new(
            (p.x - origin.x) * self.scale_x,
            (origin.y - p.y) * self.scale_y,
        )
    }

    /// Map a physical point back to (fractional) pixel coordinates.
    #[must_use]
    pub fn to_pixel(&self, p: Point) -> Point {
        let origin = self.origin.to_point();
        Point::new(
            p.x / self.scale_x + origin.x,
            origin.y - p.y / self.scale_y,
        )
    }

    /// Map every pixel point to physical space, preserving order.
    #[must_use]
    pub fn scale_points(&self, points: &[PixelPoint]) -> Vec<Point> {
        points.iter().map(|&p| self.to_physical(p)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn refs() -> ReferencePixels {
        ReferencePixels {
            left_upper: PixelPoint::new(10, 10),
            left_lower: PixelPoint::new(10, 110),
            right_lower: PixelPoint::new(210, 110),
        }
    }

    #[test]
    fn isotropic_reference_points() {
        let scaler = PhysicalScaler::new(&refs(), &ScaleConfig::default()).unwrap();
        let origin = scaler.to_physical(PixelPoint::new(10, 110));
        assert_abs_diff_eq!(origin.x, 0.0);
        assert_abs_diff_eq!(origin.y, 0.0);

        let right = scaler.to_physical(PixelPoint::new(210, 110));
        assert_abs_diff_eq!(right.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right.y, 0.0);

        let top = scaler.to_physical(PixelPoint::new(10, 10));
        assert_abs_diff_eq!(top.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn anisotropic_maps_width_to_domain_height() {
        let config = ScaleConfig {
            policy: ScalingPolicy::Anisotropic,
            ..ScaleConfig::default()
        };
        let scaler = PhysicalScaler::new(&refs(), &config).unwrap();
        let right = scaler.to_physical(PixelPoint::new(210, 110));
        assert_abs_diff_eq!(right.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scaler.scale_x(), 1.0 / 200.0);
        assert_abs_diff_eq!(scaler.scale_y(), 1.0 / 100.0);
    }

    #[test]
    fn domain_height_scales_output() {
        let config = ScaleConfig {
            domain_height: 0.5,
            ..ScaleConfig::default()
        };
        let scaler = PhysicalScaler::new(&refs(), &config).unwrap();
        let top = scaler.to_physical(PixelPoint::new(10, 10));
        assert_abs_diff_eq!(top.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn inverse_recovers_pixels() {
        for policy in [ScalingPolicy::Isotropic, ScalingPolicy::Anisotropic] {
            let config = ScaleConfig {
                domain_height: 0.37,
                policy,
            };
            let scaler = PhysicalScaler::new(&refs(), &config).unwrap();
            for (x, y) in [(0, 0), (10, 110), (123, 45), (300, 299)] {
                let back = scaler.to_pixel(scaler.to_physical(PixelPoint::new(x, y)));
                assert_abs_diff_eq!(back.x, f64::from(x), epsilon = 1e-6);
                assert_abs_diff_eq!(back.y, f64::from(y), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn zero_height_is_degenerate() {
        let mut r = refs();
        r.left_upper.y = r.left_lower.y;
        let err = PhysicalScaler::new(&r, &ScaleConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DegenerateScale {
                axis: Axis::Y,
                extent: 0
            }
        ));
    }

    #[test]
    fn zero_width_is_degenerate_only_when_anisotropic() {
        let mut r = refs();
        r.right_lower.x = r.left_lower.x;
        assert!(PhysicalScaler::new(&r, &ScaleConfig::default()).is_ok());

        let config = ScaleConfig {
            policy: ScalingPolicy::Anisotropic,
            ..ScaleConfig::default()
        };
        assert!(matches!(
            PhysicalScaler::new(&r, &config),
            Err(PipelineError::DegenerateScale { axis: Axis::X, .. })
        ));
    }

    #[test]
    fn y_axis_is_flipped() {
        let scaler = PhysicalScaler::new(&refs(), &ScaleConfig::default()).unwrap();
        let above = scaler.to_physical(PixelPoint::new(10, 60));
        let below = scaler.to_physical(PixelPoint::new(10, 120));
        assert!(above.y > 0.0);
        assert!(below.y < 0.0);
    }
}
