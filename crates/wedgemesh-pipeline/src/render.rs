//! Field rasterization: map a scalar field to an RGB image.
//!
//! Values are normalized over the finite samples of the field and
//! looked up in a perceptual colormap. The raster has exactly the
//! field's shape (one pixel per sample), so pixel coordinates downstream
//! are field indices.
//!
//! This is step 1 in the pipeline.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::field::ScalarField;

/// Color used for NaN and infinite samples.
///
/// White maps to the highest intensity, so non-finite samples never
/// become wedge foreground.
pub const NON_FINITE_COLOR: [u8; 3] = [255, 255, 255];

/// Colormap used to render a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Perceptually uniform dark-purple to yellow gradient.
    ///
    /// The solid wedge region of a simulation output carries the field
    /// minimum and renders darkest, which is what the inverted
    /// threshold keys on.
    #[default]
    Viridis,

    /// Black to white.
    Grayscale,
}

impl Colormap {
    /// Color for a normalized value `t` in `[0, 1]`.
    ///
    /// Values outside the range are clamped.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn color(self, t: f64) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Viridis => {
                let c = colorous::VIRIDIS.eval_continuous(t);
                [c.r, c.g, c.b]
            }
            Self::Grayscale => {
                // t is in [0, 1], so the product is in [0, 255].
                let v = (t * 255.0).round() as u8;
                [v, v, v]
            }
        }
    }
}

/// Render `field` to an RGB raster of the same shape.
///
/// Each finite sample `v` becomes `colormap.color((v - min) / (max - min))`
/// where `min`/`max` range over the finite samples. A constant field
/// renders every finite sample at `t = 0`. Non-finite samples render as
/// [`NON_FINITE_COLOR`].
#[must_use = "returns the rendered raster"]
pub fn render_field(field: &ScalarField, colormap: Colormap) -> RgbImage {
    let dims = field.dimensions();
    let (lo, hi) = field.finite_range().unwrap_or((0.0, 0.0));
    let span = hi - lo;
    let values = field.values();

    RgbImage::from_fn(dims.width, dims.height, |x, y| {
        let v = values[[y as usize, x as usize]];
        if !v.is_finite() {
            return Rgb(NON_FINITE_COLOR);
        }
        let t = if span > 0.0 { (v - lo) / span } else { 0.0 };
        Rgb(colormap.color(t))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    #[test]
    fn default_is_viridis() {
        assert_eq!(Colormap::default(), Colormap::Viridis);
    }

    #[test]
    fn raster_matches_field_shape() {
        let field = ScalarField::new("p", Array2::zeros((7, 11))).unwrap();
        let raster = render_field(&field, Colormap::Viridis);
        assert_eq!(raster.width(), 11);
        assert_eq!(raster.height(), 7);
    }

    #[test]
    fn grayscale_maps_extremes_to_black_and_white() {
        let field = ScalarField::new("p", array![[0.0, 5.0, 10.0]]).unwrap();
        let raster = render_field(&field, Colormap::Grayscale);
        assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(raster.get_pixel(1, 0).0, [128, 128, 128]);
        assert_eq!(raster.get_pixel(2, 0).0, [255, 255, 255]);
    }

    #[test]
    fn viridis_minimum_is_darker_than_maximum() {
        let field = ScalarField::new("p", array![[0.0, 1.0]]).unwrap();
        let raster = render_field(&field, Colormap::Viridis);
        let luma = |p: &Rgb<u8>| p.0.iter().map(|&c| u32::from(c)).sum::<u32>();
        assert!(luma(raster.get_pixel(0, 0)) < luma(raster.get_pixel(1, 0)));
    }

    #[test]
    fn constant_field_renders_at_range_start() {
        let field = ScalarField::new("p", Array2::from_elem((3, 3), 42.0)).unwrap();
        let raster = render_field(&field, Colormap::Grayscale);
        assert!(raster.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn non_finite_samples_render_white() {
        let field = ScalarField::new("p", array![[0.0, f64::NAN, 1.0, f64::INFINITY]]).unwrap();
        let raster = render_field(&field, Colormap::Viridis);
        assert_eq!(raster.get_pixel(1, 0).0, NON_FINITE_COLOR);
        assert_eq!(raster.get_pixel(3, 0).0, NON_FINITE_COLOR);
    }

    #[test]
    fn non_finite_samples_do_not_stretch_range() {
        let field =
            ScalarField::new("p", array![[0.0, f64::NEG_INFINITY, 10.0]]).unwrap();
        let raster = render_field(&field, Colormap::Grayscale);
        assert_eq!(raster.get_pixel(2, 0).0, [255, 255, 255]);
        assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 0]);
    }
}
