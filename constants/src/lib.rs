//! Shared constants for the map annotation workspace.

pub mod coordinate_system;
pub mod occupancy;
pub mod path;
pub mod render_settings;
pub mod tools;
pub mod zone;
