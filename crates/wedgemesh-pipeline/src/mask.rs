//! Binary wedge mask and dominant-contour selection.
//!
//! The wedge renders darkest, so the mask is an *inverted* threshold:
//! intensities at or below the cutoff become foreground (255) and
//! everything else background (0). The outer borders of the mask's
//! top-level components are traced and the one with the largest
//! enclosed area is taken as the wedge.
//!
//! This is step 3 in the pipeline, after denoising.

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::contour::{self, Contour};
use crate::denoise;
use crate::types::PipelineError;

/// Foreground value in a binary mask.
pub const FOREGROUND: u8 = 255;

/// Background value in a binary mask.
pub const BACKGROUND: u8 = 0;

/// Denoising and thresholding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Median filter radius in pixels (kernel side is `2r + 1`).
    /// 0 disables the filter.
    pub median_radius: u32,

    /// Gaussian blur sigma applied after the median filter.
    /// 0 disables the blur.
    pub gaussian_sigma: f32,

    /// Intensity cutoff. Pixels at or below it are foreground.
    pub threshold: u8,
}

impl MaskConfig {
    /// Default median filter radius (an 11 x 11 kernel).
    pub const DEFAULT_MEDIAN_RADIUS: u32 = 5;

    /// Default Gaussian sigma (disabled).
    pub const DEFAULT_GAUSSIAN_SIGMA: f32 = 0.0;

    /// Default intensity cutoff.
    pub const DEFAULT_THRESHOLD: u8 = 30;
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            median_radius: Self::DEFAULT_MEDIAN_RADIUS,
            gaussian_sigma: Self::DEFAULT_GAUSSIAN_SIGMA,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

/// Everything produced while extracting the wedge mask.
#[derive(Debug, Clone)]
pub struct MaskExtraction {
    /// Denoised intensity image the threshold was applied to.
    pub intensity: GrayImage,

    /// Binary mask, [`FOREGROUND`] on the wedge.
    pub mask: GrayImage,

    /// Number of top-level foreground components.
    pub component_count: usize,

    /// Outer border of the largest component.
    pub contour: Contour,
}

/// Inverted binary threshold.
///
/// Pixels with intensity `<= cutoff` become [`FOREGROUND`], all others
/// [`BACKGROUND`].
#[must_use = "returns the binary mask"]
pub fn threshold_inverted(image: &GrayImage, cutoff: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] <= cutoff {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Extract the dominant wedge region from a rendered raster.
///
/// Converts to intensity, denoises, thresholds, traces top-level
/// components, and keeps the one with the largest enclosed area.
///
/// # Errors
///
/// Returns [`PipelineError::NoContourFound`] if the mask has no
/// foreground component enclosing a non-zero area.
pub fn extract(raster: &RgbImage, config: &MaskConfig) -> Result<MaskExtraction, PipelineError> {
    let gray = denoise::to_intensity(raster);
    let intensity = denoise::denoise(&gray, config.median_radius, config.gaussian_sigma);
    let mask = threshold_inverted(&intensity, config.threshold);

    let components = contour::extract_components(&mask);
    let component_count = components.len();
    tracing::debug!(
        component_count,
        threshold = config.threshold,
        "traced mask components"
    );

    let contour = contour::largest_component(components).ok_or(PipelineError::NoContourFound)?;
    tracing::debug!(
        area = contour.area(),
        points = contour.len(),
        "selected dominant contour"
    );

    Ok(MaskExtraction {
        intensity,
        mask,
        component_count,
        contour,
    })
}
