//! Defaults applied when the manifest omits a tool's settings.

/// Wall stroke width in map pixels.
pub const DEFAULT_WALL_WIDTH_PX: u32 = 4;

/// Pick radius around editable nodes in metres.
pub const DEFAULT_NODE_RADIUS: f32 = 0.15;

pub const DEFAULT_WALL_ERASER_RADIUS: f32 = 0.2;
pub const DEFAULT_FLOOR_BRUSH_RADIUS: f32 = 0.25;

/// Smallest accepted brush radius, below this a brush touches nothing useful.
pub const MIN_BRUSH_RADIUS: f32 = 0.001;
