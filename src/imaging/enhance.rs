use image::{Rgb, RgbImage};

use super::ImagingError;

const PURIKURA_SATURATION: f32 = 1.08;
const PURIKURA_BRIGHTNESS: f32 = 1.02;
const PURIKURA_SHARPNESS: f32 = 1.1;

// ITU-R 601-2 luma, same weights PIL uses for mode "L".
pub fn luma(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    (r as f32 * 299.0 + g as f32 * 587.0 + b as f32 * 114.0) / 1000.0
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn lerp(degenerate: f32, value: f32, factor: f32) -> u8 {
    clamp_channel(degenerate + factor * (value - degenerate))
}

/// `a * (1 - alpha) + b * alpha`, per channel.
pub fn blend(a: &RgbImage, b: &RgbImage, alpha: f32) -> Result<RgbImage, ImagingError> {
    if a.dimensions() != b.dimensions() {
        return Err(ImagingError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        for channel in 0..3 {
            dst.0[channel] = lerp(dst.0[channel] as f32, src.0[channel] as f32, alpha);
        }
    }
    Ok(out)
}

pub fn adjust_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let gray = luma(pixel);
        for channel in 0..3 {
            pixel.0[channel] = lerp(gray, pixel.0[channel] as f32, factor);
        }
    }
    out
}

pub fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in 0..3 {
            pixel.0[channel] = lerp(0.0, pixel.0[channel] as f32, factor);
        }
    }
    out
}

pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let total: f64 = image.pixels().map(|pixel| luma(pixel) as f64).sum();
    let mean = (total / count as f64).round() as f32;

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in 0..3 {
            pixel.0[channel] = lerp(mean, pixel.0[channel] as f32, factor);
        }
    }
    out
}

// 3x3 smoothing kernel [1 1 1; 1 5 1; 1 1 1] / 13. Border rows and columns are copied.
fn smooth(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0f32; 3];
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5.0 } else { 1.0 };
                    let neighbor = image.get_pixel(x + dx - 1, y + dy - 1);
                    for channel in 0..3 {
                        sums[channel] += neighbor.0[channel] as f32 * weight;
                    }
                }
            }
            let target = out.get_pixel_mut(x, y);
            for channel in 0..3 {
                target.0[channel] = clamp_channel(sums[channel] / 13.0);
            }
        }
    }
    out
}

pub fn adjust_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let degenerate = smooth(image);
    let mut out = image.clone();
    for (pixel, soft) in out.pixels_mut().zip(degenerate.pixels()) {
        for channel in 0..3 {
            pixel.0[channel] = lerp(soft.0[channel] as f32, pixel.0[channel] as f32, factor);
        }
    }
    out
}

/// Vivid colors, a touch of brightness and crisper edges.
pub fn purikura_boost(image: &RgbImage) -> RgbImage {
    let boosted = adjust_saturation(image, PURIKURA_SATURATION);
    let boosted = adjust_brightness(&boosted, PURIKURA_BRIGHTNESS);
    adjust_sharpness(&boosted, PURIKURA_SHARPNESS)
}
