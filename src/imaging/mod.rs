pub mod background;
pub mod enhance;
pub mod grid;
pub mod upscale;
pub mod vintage;

#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("Image dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    #[error("Invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("No images to compose")]
    Empty,
}
