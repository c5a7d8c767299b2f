use image::imageops::{self, FilterType};
use image::RgbImage;

use super::enhance::{adjust_contrast, adjust_saturation, blend};
use super::ImagingError;

const SMOOTHING_SIGMA: f32 = 0.3;
const UNSHARP_RADIUS: f32 = 1.5;
const UNSHARP_PERCENT: f32 = 80.0;
const UNSHARP_THRESHOLD: i16 = 2;
const SHARPENED_WEIGHT: f32 = 0.7;
const FINAL_CONTRAST: f32 = 1.02;
const FINAL_SATURATION: f32 = 1.03;

/// Largest output edge, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Output size for a target width, keeping the reference aspect ratio.
pub fn target_size(reference: (u32, u32), width: u32) -> Result<(u32, u32), ImagingError> {
    let (ref_width, ref_height) = reference;
    if width == 0 || ref_width == 0 || ref_height == 0 {
        return Err(ImagingError::InvalidSize {
            width: ref_width,
            height: ref_height,
        });
    }
    let height = (width as u64 * ref_height as u64 / ref_width as u64).max(1);
    if width > MAX_DIMENSION || height > MAX_DIMENSION as u64 {
        return Err(ImagingError::InvalidSize {
            width,
            height: u32::try_from(height).unwrap_or(u32::MAX),
        });
    }
    Ok((width, height as u32))
}

pub fn unsharp_mask(image: &RgbImage, radius: f32, percent: f32, threshold: i16) -> RgbImage {
    let blurred = imageops::blur(image, radius);
    let amount = percent / 100.0;
    let mut out = image.clone();
    for (pixel, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for channel in 0..3 {
            let original = pixel.0[channel] as i16;
            let diff = original - soft.0[channel] as i16;
            if diff.abs() >= threshold {
                let sharpened = original as f32 + diff as f32 * amount;
                pixel.0[channel] = sharpened.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Lanczos resize followed by a light smooth/sharpen pass and a small color lift.
pub fn enhanced_upscale(image: &RgbImage, target: (u32, u32)) -> Result<RgbImage, ImagingError> {
    let (width, height) = target;
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidSize { width, height });
    }

    let upscaled = imageops::resize(image, width, height, FilterType::Lanczos3);
    let smoothed = imageops::blur(&upscaled, SMOOTHING_SIGMA);
    let sharpened = unsharp_mask(&smoothed, UNSHARP_RADIUS, UNSHARP_PERCENT, UNSHARP_THRESHOLD);
    let result = blend(&upscaled, &sharpened, SHARPENED_WEIGHT)?;
    let result = adjust_contrast(&result, FINAL_CONTRAST);
    Ok(adjust_saturation(&result, FINAL_SATURATION))
}
