use image::{Rgb, RgbImage};
use rand::Rng;

use super::enhance::luma;

const FADED_BLACK: f32 = 37.0;
const FADED_WHITE: f32 = 235.0;
pub const FILM_GRAIN_INTENSITY: f32 = 0.015;

/// Grayscale print with lifted blacks (#252525) and dulled whites (#EBEBEB).
pub fn faded_monochrome(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let value = luma(pixel).round();
        let faded = (FADED_BLACK + (value / 255.0) * (FADED_WHITE - FADED_BLACK)) as u8;
        *pixel = Rgb([faded, faded, faded]);
    }
    out
}

/// Uniform grain, one offset per pixel shared by all channels so gray stays gray.
pub fn add_film_grain<R: Rng>(image: &RgbImage, intensity: f32, rng: &mut R) -> RgbImage {
    let spread = 255.0 * intensity * 2.0;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let grain = ((rng.gen::<f32>() - 0.5) * spread) as i16;
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as i16 + grain).clamp(0, 255) as u8;
        }
    }
    out
}

/// Faded monochrome with film grain, the New York print look.
pub fn vintage_print<R: Rng>(image: &RgbImage, rng: &mut R) -> RgbImage {
    add_film_grain(&faded_monochrome(image), FILM_GRAIN_INTENSITY, rng)
}
