//! Intensity extraction and noise reduction before thresholding.
//!
//! The rendered raster is reduced to a single luma channel, then
//! cleaned with a median filter (which removes speckle while keeping
//! the wedge's straight edges sharp) and an optional Gaussian blur.
//!
//! This is step 2 in the pipeline.

use image::{GrayImage, RgbImage};

/// Convert an RGB raster to single-channel intensity.
///
/// Uses the `image` crate's luma weights (Rec. 709).
#[must_use = "returns the intensity image"]
pub fn to_intensity(raster: &RgbImage) -> GrayImage {
    image::imageops::grayscale(raster)
}

/// Apply a square median filter of the given radius.
///
/// The kernel is `2 * radius + 1` pixels on a side. A radius of 0
/// returns the image unchanged.
#[must_use = "returns the filtered image"]
pub fn median_filter(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    imageproc::filter::median_filter(image, radius, radius)
}

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values (zero or negative) return the image
/// unchanged, since `imageproc`'s underlying function panics on
/// `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Median filter followed by Gaussian blur.
#[must_use = "returns the denoised image"]
pub fn denoise(image: &GrayImage, median_radius: u32, sigma: f32) -> GrayImage {
    gaussian_blur(&median_filter(image, median_radius), sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn intensity_preserves_gray_values() {
        let rgb = RgbImage::from_fn(3, 1, |x, _| {
            let v = [0, 128, 255][x as usize];
            image::Rgb([v, v, v])
        });
        let gray = to_intensity(&rgb);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 128);
        assert_eq!(gray.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn zero_radius_median_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(median_filter(&img, 0), img);
    }

    #[test]
    fn median_removes_isolated_speckle() {
        let mut img = GrayImage::from_pixel(9, 9, image::Luma([200]));
        img.put_pixel(4, 4, image::Luma([0]));
        let filtered = median_filter(&img, 1);
        assert_eq!(filtered.get_pixel(4, 4).0[0], 200);
    }

    #[test]
    fn median_keeps_straight_edge() {
        let img = sharp_edge_image();
        let filtered = median_filter(&img, 2);
        for y in 0..10 {
            assert_eq!(filtered.get_pixel(2, y).0[0], 0);
            assert_eq!(filtered.get_pixel(7, y).0[0], 255);
        }
    }

    #[test]
    fn zero_sigma_returns_identical_image() {
        let img = sharp_edge_image();
        let blurred = gaussian_blur(&img, 0.0);
        assert_eq!(img, blurred);
    }

    #[test]
    fn negative_sigma_returns_identical_image() {
        let img = sharp_edge_image();
        let blurred = gaussian_blur(&img, -1.0);
        assert_eq!(img, blurred);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let img = sharp_edge_image();
        let blurred = gaussian_blur(&img, 2.0);

        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn denoise_without_filters_is_identity() {
        let img = sharp_edge_image();
        assert_eq!(denoise(&img, 0, 0.0), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let out = denoise(&img, 3, 1.4);
        assert_eq!(out.width(), 17);
        assert_eq!(out.height(), 31);
    }
}
