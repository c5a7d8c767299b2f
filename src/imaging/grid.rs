use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::ImagingError;

pub const DEFAULT_CELL: (u32, u32) = (400, 267);
const LABEL_GAP: u32 = 40;

/// Inputs on the top row, styled outputs below, one column per photo.
pub fn comparison_grid(
    inputs: &[RgbImage],
    outputs: &[RgbImage],
    cell: (u32, u32),
) -> Result<RgbImage, ImagingError> {
    let (cell_width, cell_height) = cell;
    if cell_width == 0 || cell_height == 0 {
        return Err(ImagingError::InvalidSize {
            width: cell_width,
            height: cell_height,
        });
    }

    let columns = inputs.len().min(outputs.len()) as u32;
    if columns == 0 {
        return Err(ImagingError::Empty);
    }

    let mut grid = RgbImage::from_pixel(
        cell_width * columns,
        cell_height * 2 + LABEL_GAP,
        Rgb([255, 255, 255]),
    );

    for (index, (input, output)) in inputs.iter().zip(outputs.iter()).enumerate() {
        let x = (index as u32 * cell_width) as i64;
        let top = imageops::resize(input, cell_width, cell_height, FilterType::Lanczos3);
        let bottom = imageops::resize(output, cell_width, cell_height, FilterType::Lanczos3);
        imageops::replace(&mut grid, &top, x, 0);
        imageops::replace(&mut grid, &bottom, x, (cell_height + LABEL_GAP) as i64);
    }

    Ok(grid)
}
