//! The editable occupancy map and everything that reads or writes its pixels.
//!
//! ## Buffer Layout
//!
//! Grids store RGBA8 pixels with stride `width * 4`. Row 0 is the bottom of
//! the map (world `y = origin.y`); image files and GPU textures use the
//! opposite order, so conversion happens only at those edges.
//!
//! ```text
//! screen ──CoordinateMapper──> world (m) ──floor((w - origin) / res)──> pixel
//!                                                     │
//!                                      RasterEditor ──┘  brush, line, polygon
//! ```

/// Screen, world and pixel coordinate conversions.
pub mod coordinate_mapper;

/// Map quad and zone overlay quad textured from the grids.
pub mod map_render;

/// RGBA raster with dirty tracking, snapshots and PNG encoding.
pub mod occupancy_grid;

/// Saving edited maps next to their source raster.
pub mod persistence;

/// Brush, line and polygon rasterisation.
pub mod raster_editor;

/// Byte snapshots used to roll back uncommitted edits.
pub mod snapshot;
