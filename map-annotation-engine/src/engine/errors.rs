use std::io;
use thiserror::Error;

/// Failures at the map I/O edges: decoding rasters, building grids, saving edits.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("An I/O error occurred: {0}")]
    Io(#[from] io::Error),

    #[error("Could not decode or encode map raster: {0}")]
    Image(#[from] image::ImageError),

    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Map resolution must be positive and finite, got {0}")]
    InvalidResolution(f32),

    #[error("Map raster is empty")]
    EmptyRaster,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}
