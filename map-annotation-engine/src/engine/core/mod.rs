//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, state transitions,
//! session identity and viewport resize propagation for both native and WASM
//! targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with asset loaders, tool systems, map rendering and
/// platform-specific configurations.
pub mod app_setup;

/// Application state machine and loading transitions.
pub mod app_state;

/// Viewport resize hook for size-dependent resources.
pub mod resize;

/// Map and site identity shared by every tool.
pub mod session;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
