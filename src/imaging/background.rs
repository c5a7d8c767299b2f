use image::RgbImage;
use serde::Serialize;

use crate::color::BackgroundColor;

const EDGE_BAND: f32 = 0.15;
const VERIFY_BAND: f32 = 0.05;

fn band(length: u32, fraction: f32) -> u32 {
    ((length as f32 * fraction) as u32).max(1)
}

fn in_band(x: u32, y: u32, width: u32, height: u32, fraction: f32) -> bool {
    let side = band(width, fraction);
    let edge = band(height, fraction);
    x < side || x >= width.saturating_sub(side) || y < edge || y >= height.saturating_sub(edge)
}

/// Paints near-white pixels with `color`. Returns how many pixels changed.
///
/// A pixel qualifies when all three channels are strictly above `threshold`.
/// With `edge_aware` only the outer 15% band on each side is considered,
/// which keeps light clothing and text in the middle of the frame intact.
pub fn enforce_background(
    image: &mut RgbImage,
    color: BackgroundColor,
    threshold: u8,
    edge_aware: bool,
) -> usize {
    let (width, height) = image.dimensions();
    let target = color.to_rgb();
    let mut replaced = 0usize;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if edge_aware && !in_band(x, y, width, height, EDGE_BAND) {
            continue;
        }
        let [r, g, b] = pixel.0;
        if r > threshold && g > threshold && b > threshold && *pixel != target {
            *pixel = target;
            replaced += 1;
        }
    }

    replaced
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundReport {
    pub expected: BackgroundColor,
    pub sampled: usize,
    pub matching: usize,
}

impl BackgroundReport {
    pub fn ratio(&self) -> f32 {
        if self.sampled == 0 {
            return 0.0;
        }
        self.matching as f32 / self.sampled as f32
    }

    pub fn passes(&self, min_ratio: f32) -> bool {
        self.sampled > 0 && self.ratio() >= min_ratio
    }
}

/// Samples the outer border band and counts pixels close to the expected color.
pub fn verify_background(
    image: &RgbImage,
    expected: BackgroundColor,
    tolerance: u8,
) -> BackgroundReport {
    let (width, height) = image.dimensions();
    let mut sampled = 0usize;
    let mut matching = 0usize;

    for (x, y, pixel) in image.enumerate_pixels() {
        if !in_band(x, y, width, height, VERIFY_BAND) {
            continue;
        }
        sampled += 1;
        if expected.is_near(pixel, tolerance) {
            matching += 1;
        }
    }

    BackgroundReport {
        expected,
        sampled,
        matching,
    }
}
