//! PNG encoding of pipeline rasters.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use wedgemesh_pipeline::StagedResult;

use crate::stage::StageId;

/// Encode raw pixel bytes as PNG.
fn encode(
    bytes: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
) -> Result<Vec<u8>, ImageError> {
    let mut png_bytes = Vec::new();
    PngEncoder::new(&mut png_bytes).write_image(bytes, width, height, color)?;
    Ok(png_bytes)
}

/// Encode one stage of a staged run as PNG bytes.
///
/// The raster is RGB; intensity and mask are 8-bit grayscale.
///
/// # Errors
///
/// Returns the encoder's error if PNG encoding fails.
pub fn encode_stage(staged: &StagedResult, stage: StageId) -> Result<Vec<u8>, ImageError> {
    match stage {
        StageId::Raster => {
            let img = &staged.raster;
            encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        }
        StageId::Intensity => {
            let img = &staged.intensity;
            encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
        }
        StageId::Mask => {
            let img = &staged.mask;
            encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
        }
    }
}
