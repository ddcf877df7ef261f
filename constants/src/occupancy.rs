//! Pixel colours following the map_server trinary convention.

pub type Rgba = [u8; 4];

pub const OCCUPIED: Rgba = [0, 0, 0, 255];
pub const FREE: Rgba = [255, 255, 255, 255];
pub const UNKNOWN: Rgba = [205, 205, 205, 255];

/// Background of the zone overlay raster.
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// map_server thresholds used when decoding greyscale rasters.
pub const OCCUPIED_THRESHOLD: f32 = 0.65;
pub const FREE_THRESHOLD: f32 = 0.196;
