//! Reference-pixel detection.
//!
//! Finds the foreground pixels that extremize `x + y` and `x - y`
//! (image coordinates, +Y down). On a wedge these are the top-left,
//! bottom-left and bottom-right corners of the solid region, and they
//! anchor the pixel-to-physical transform.
//!
//! This is step 4 in the pipeline.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::types::{PixelPoint, ReferencePixels};

/// Which image the reference pixels are searched in.
///
/// The lower-wall mirror projects points onto the left-lower reference
/// row, which is the domain floor only for [`ReferenceSource::Intensity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    /// Foreground pixels of the binary wedge mask.
    Mask,

    /// Every pixel with non-zero denoised intensity: the rendered
    /// extent of the domain.
    #[default]
    Intensity,
}

/// Whether the reference pixels join the geometry or only define scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Reference pixels only define the transform.
    #[default]
    ScaleOnly,

    /// Reference pixels are added to the approximated vertices before
    /// count normalization.
    Union,
}

/// Reference-pixel parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Image searched for the extremes.
    pub source: ReferenceSource,

    /// Role of the reference pixels in the geometry.
    pub policy: ReferencePolicy,
}

/// Locate the three reference pixels among the non-zero pixels of
/// `image`.
///
/// Pixels are visited in row-major order and only a strictly better
/// candidate replaces the current one, so ties resolve to the first
/// pixel in that order. Returns `None` if no pixel is non-zero.
#[must_use]
pub fn find_reference_pixels(image: &GrayImage) -> Option<ReferencePixels> {
    let mut best: Option<(ReferencePixels, [i64; 3])> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        let p = PixelPoint::new(x, y);
        let sum = i64::from(x) + i64::from(y);
        let diff = i64::from(x) - i64::from(y);

        match &mut best {
            None => {
                best = Some((
                    ReferencePixels {
                        left_upper: p,
                        left_lower: p,
                        right_lower: p,
                    },
                    [sum, diff, sum],
                ));
            }
            Some((refs, [min_sum, min_diff, max_sum])) => {
                if sum < *min_sum {
                    *min_sum = sum;
                    refs.left_upper = p;
                }
                if diff < *min_diff {
                    *min_diff = diff;
                    refs.left_lower = p;
                }
                if sum > *max_sum {
                    *max_sum = sum;
                    refs.right_lower = p;
                }
            }
        }
    }

    best.map(|(refs, _)| refs)
}
