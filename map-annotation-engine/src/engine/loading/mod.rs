//! Staged loading of an editing session.
//!
//! Loads the editor manifest, then the map raster it names, and finally
//! builds the grids, tools and camera before switching to the running state.

/// Manifest and raster loading systems plus session construction.
pub mod manifest_loader;

/// Loading progress tracking resource for state transitions.
pub mod progress;
