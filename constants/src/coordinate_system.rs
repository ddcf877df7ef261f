/// Maps live on the world XY plane (Z up, REP-103 convention).
pub const MAP_PLANE_Z: f32 = 0.0;

/// Height offsets keep overlays from z-fighting with the map quad.
pub const ZONE_OVERLAY_Z: f32 = 0.001;
pub const PREVIEW_Z: f32 = 0.01;
pub const POSE_OVERLAY_Z: f32 = 0.02;

/// Rays closer to parallel than this are treated as missing the map plane.
pub const RAY_PARALLEL_EPSILON: f32 = 1.0e-6;
