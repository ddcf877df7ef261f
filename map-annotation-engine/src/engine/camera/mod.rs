//! Top-down viewport camera for map navigation.
//!
//! Provides right-drag panning and scroll zoom over the map plane, with the
//! pan rate derived from the viewport size so the map tracks the cursor.

/// Viewport camera resource, marker component and controller system.
pub mod viewport_camera;
