//! Assets describing an editing session.
//!
//! Handles the editor manifest, the map raster loader and the robot model
//! used by pose estimation.

/// Editor manifest: map source, session ids, robot model and tool settings.
pub mod editor_manifest;

/// Map raster asset and its PNG/PGM loader.
pub mod map_raster;

/// Robot footprint, sensor mount and sensor cloud.
pub mod robot_model;
