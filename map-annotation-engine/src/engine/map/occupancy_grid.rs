use crate::engine::errors::MapError;
use crate::engine::map::coordinate_mapper::CoordinateMapper;
use crate::engine::map::snapshot::EditSnapshot;
use bevy::prelude::*;
use constants::occupancy::{
    FREE, FREE_THRESHOLD, OCCUPIED, OCCUPIED_THRESHOLD, Rgba, UNKNOWN,
};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage, imageops};

/// Grid geometry shared by the map raster and every overlay drawn on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapInfo {
    pub width: u32,
    pub height: u32,
    /// Metres per pixel.
    pub resolution: f32,
    /// World position of the lower-left corner of pixel (0, 0).
    pub origin: Vec2,
}

impl MapInfo {
    pub fn new(width: u32, height: u32, resolution: f32, origin: Vec2) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyRaster);
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(MapError::InvalidResolution(resolution));
        }

        Ok(Self {
            width,
            height,
            resolution,
            origin,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Extent of the map in metres.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.resolution
    }

    pub fn world_center(&self) -> Vec2 {
        self.origin + self.world_size() * 0.5
    }
}

/// RGBA raster backing an editable map.
///
/// Row `iy` of the buffer covers world `y` in
/// `[origin.y + iy * resolution, origin.y + (iy + 1) * resolution)`, so row 0 is the
/// bottom of the map. Image files store the top row first; conversion happens in
/// [`OccupancyGrid::from_map_image`] and [`OccupancyGrid::to_image`].
#[derive(Resource, Debug, Clone)]
pub struct OccupancyGrid {
    info: MapInfo,
    pixels: RgbaImage,
    dirty: bool,
}

impl OccupancyGrid {
    pub fn filled(info: MapInfo, colour: Rgba) -> Self {
        Self {
            info,
            pixels: RgbaImage::from_pixel(info.width, info.height, image::Rgba(colour)),
            dirty: true,
        }
    }

    /// Wrap an existing flat RGBA buffer (stride `width * 4`, row 0 at `origin.y`).
    pub fn from_raw(info: MapInfo, bytes: Vec<u8>) -> Result<Self, MapError> {
        let actual = bytes.len();
        let mismatch = MapError::DimensionMismatch {
            width: info.width,
            height: info.height,
            expected: info.byte_len(),
            actual,
        };
        if actual != info.byte_len() {
            return Err(mismatch);
        }

        let pixels = RgbaImage::from_raw(info.width, info.height, bytes).ok_or(mismatch)?;
        Ok(Self {
            info,
            pixels,
            dirty: true,
        })
    }

    /// Build a grid from a decoded map image, classifying every pixel into the
    /// occupied/free/unknown palette.
    pub fn from_map_image(
        raster: &RgbaImage,
        resolution: f32,
        origin: Vec2,
    ) -> Result<Self, MapError> {
        let info = MapInfo::new(raster.width(), raster.height(), resolution, origin)?;

        let mut pixels = imageops::flip_vertical(raster);
        for pixel in pixels.pixels_mut() {
            *pixel = image::Rgba(classify_map_pixel(pixel.0));
        }

        Ok(Self {
            info,
            pixels,
            dirty: true,
        })
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.info)
    }

    pub fn contains(&self, pixel: IVec2) -> bool {
        pixel.x >= 0
            && pixel.y >= 0
            && (pixel.x as u32) < self.info.width
            && (pixel.y as u32) < self.info.height
    }

    pub fn pixel(&self, pixel: IVec2) -> Option<Rgba> {
        self.contains(pixel)
            .then(|| self.pixels.get_pixel(pixel.x as u32, pixel.y as u32).0)
    }

    /// Write one pixel. Out-of-bounds writes are dropped. Returns whether the
    /// stored colour changed.
    pub fn put_pixel(&mut self, pixel: IVec2, colour: Rgba) -> bool {
        if !self.contains(pixel) {
            return false;
        }

        let current = self.pixels.get_pixel_mut(pixel.x as u32, pixel.y as u32);
        if current.0 == colour {
            return false;
        }
        current.0 = colour;
        true
    }

    /// Reset every pixel to `colour`.
    pub fn fill(&mut self, colour: Rgba) {
        for pixel in self.pixels.pixels_mut() {
            pixel.0 = colour;
        }
        self.dirty = true;
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn count_colour(&self, colour: Rgba) -> usize {
        self.pixels.pixels().filter(|p| p.0 == colour).count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn snapshot(&self) -> EditSnapshot {
        EditSnapshot::new(self.info.width, self.info.height, self.pixels.as_raw().clone())
    }

    /// Overwrite the buffer with a snapshot taken from this grid.
    pub fn restore(&mut self, snapshot: &EditSnapshot) -> bool {
        if !snapshot.matches(self.info.width, self.info.height) {
            warn!(
                "Snapshot {}x{} does not match grid {}x{}, restore skipped",
                snapshot.width(),
                snapshot.height(),
                self.info.width,
                self.info.height
            );
            return false;
        }

        self.pixels.copy_from_slice(snapshot.bytes());
        self.dirty = true;
        true
    }

    /// Buffer in image row order (top row first), as written to disk and textures.
    pub fn to_image(&self) -> RgbaImage {
        imageops::flip_vertical(&self.pixels)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, MapError> {
        let raster = self.to_image();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ColorType::Rgba8,
        )?;
        Ok(bytes)
    }
}

/// Collapse an arbitrary map pixel onto the trinary palette using the
/// map_server occupancy thresholds. Fully transparent pixels are unknown.
pub fn classify_map_pixel(pixel: Rgba) -> Rgba {
    if pixel[3] == 0 {
        return UNKNOWN;
    }

    let luminance = (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / (3.0 * 255.0);
    let occupancy = 1.0 - luminance;

    if occupancy > OCCUPIED_THRESHOLD {
        OCCUPIED
    } else if occupancy < FREE_THRESHOLD {
        FREE
    } else {
        UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> MapInfo {
        MapInfo::new(width, height, 0.05, Vec2::ZERO).unwrap()
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(matches!(
            MapInfo::new(0, 10, 0.05, Vec2::ZERO),
            Err(MapError::EmptyRaster)
        ));
        assert!(matches!(
            MapInfo::new(10, 10, 0.0, Vec2::ZERO),
            Err(MapError::InvalidResolution(_))
        ));
        assert!(matches!(
            MapInfo::new(10, 10, f32::NAN, Vec2::ZERO),
            Err(MapError::InvalidResolution(_))
        ));
    }

    #[test]
    fn from_raw_checks_length() {
        let err = OccupancyGrid::from_raw(info(4, 4), vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            MapError::DimensionMismatch {
                expected: 64,
                actual: 10,
                ..
            }
        ));

        let grid = OccupancyGrid::from_raw(info(4, 4), vec![7; 64]).unwrap();
        assert_eq!(grid.pixel(IVec2::new(3, 3)), Some([7, 7, 7, 7]));
    }

    #[test]
    fn out_of_bounds_access_is_clipped() {
        let mut grid = OccupancyGrid::filled(info(4, 4), FREE);
        assert_eq!(grid.pixel(IVec2::new(-1, 0)), None);
        assert_eq!(grid.pixel(IVec2::new(4, 0)), None);
        assert!(!grid.put_pixel(IVec2::new(0, 4), OCCUPIED));
        assert!(grid.put_pixel(IVec2::new(0, 3), OCCUPIED));
        assert!(!grid.put_pixel(IVec2::new(0, 3), OCCUPIED));
        assert_eq!(grid.count_colour(OCCUPIED), 1);
    }

    #[test]
    fn map_images_are_flipped_and_classified() {
        let mut raster = RgbaImage::from_pixel(2, 2, image::Rgba([254, 254, 254, 255]));
        // Top-left in the file is the highest row of the map.
        raster.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        raster.put_pixel(1, 1, image::Rgba([205, 205, 205, 255]));

        let grid = OccupancyGrid::from_map_image(&raster, 0.1, Vec2::ZERO).unwrap();
        assert_eq!(grid.pixel(IVec2::new(0, 1)), Some(OCCUPIED));
        assert_eq!(grid.pixel(IVec2::new(1, 0)), Some(UNKNOWN));
        assert_eq!(grid.pixel(IVec2::new(0, 0)), Some(FREE));
        assert_eq!(grid.to_image().get_pixel(0, 0).0, OCCUPIED);
    }

    #[test]
    fn png_encoding_round_trips_through_the_decoder() {
        let mut grid = OccupancyGrid::filled(info(3, 2), FREE);
        grid.put_pixel(IVec2::new(2, 0), OCCUPIED);

        let bytes = grid.encode_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let reloaded = OccupancyGrid::from_map_image(&decoded, 0.05, Vec2::ZERO).unwrap();

        assert_eq!(reloaded.as_raw(), grid.as_raw());
    }

    #[test]
    fn restore_rejects_foreign_snapshots() {
        let mut grid = OccupancyGrid::filled(info(4, 4), FREE);
        let other = OccupancyGrid::filled(info(2, 2), OCCUPIED).snapshot();
        assert!(!grid.restore(&other));
        assert_eq!(grid.count_colour(FREE), 16);
    }
}
