use crate::engine::errors::MapError;
use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use image::RgbaImage;

/// Decoded map raster in file row order (top row first).
#[derive(Asset, TypePath, Debug, Clone)]
pub struct MapRaster {
    pub image: RgbaImage,
}

impl MapRaster {
    /// Decode a PNG or PGM map, expanding greyscale to RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, MapError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(MapError::EmptyRaster);
        }
        Ok(Self { image })
    }
}

#[derive(Default)]
pub struct MapRasterLoader;

impl AssetLoader for MapRasterLoader {
    type Asset = MapRaster;
    type Settings = ();
    type Error = MapError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<MapRaster, MapError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let raster = MapRaster::decode(&bytes)?;
        debug!(
            "Decoded map raster {} ({}x{})",
            load_context.path().display(),
            raster.image.width(),
            raster.image.height()
        );
        Ok(raster)
    }

    fn extensions(&self) -> &[&str] {
        &["pgm", "png"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::occupancy_grid::OccupancyGrid;
    use constants::occupancy::{FREE, OCCUPIED, UNKNOWN};

    #[test]
    fn decodes_ascii_pgm_as_greyscale_rgba() {
        let pgm = b"P2\n3 2\n255\n0 255 205\n255 0 255\n";
        let raster = MapRaster::decode(pgm).unwrap();

        assert_eq!(raster.image.dimensions(), (3, 2));
        assert_eq!(raster.image.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(raster.image.get_pixel(2, 0).0, [205, 205, 205, 255]);
        assert_eq!(raster.image.get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            MapRaster::decode(b"not a map"),
            Err(MapError::Image(_))
        ));
    }

    #[test]
    fn png_round_trip_preserves_the_grid() {
        let pgm = b"P2\n3 2\n255\n0 255 205\n255 0 255\n";
        let raster = MapRaster::decode(pgm).unwrap();
        let grid = OccupancyGrid::from_map_image(&raster.image, 0.05, Vec2::ZERO).unwrap();

        // Top image row becomes buffer row 1.
        assert_eq!(grid.pixel(IVec2::new(0, 1)), Some(OCCUPIED));
        assert_eq!(grid.pixel(IVec2::new(1, 1)), Some(FREE));
        assert_eq!(grid.pixel(IVec2::new(2, 1)), Some(UNKNOWN));

        let png = grid.encode_png().unwrap();
        let decoded = MapRaster::decode(&png).unwrap();
        let reloaded = OccupancyGrid::from_map_image(&decoded.image, 0.05, Vec2::ZERO).unwrap();
        assert_eq!(reloaded.as_raw(), grid.as_raw());
    }
}
