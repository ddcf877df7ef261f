use bevy::color::Color;

pub const DRAW_LINE_WIDTH: f32 = 0.03;
pub const DRAW_VERTEX_SIZE: f32 = 0.05;
pub const SELECTED_VERTEX_SIZE: f32 = 0.08;
pub const CURSOR_MARKER_SIZE: f32 = 0.04;

pub const NODE_COLOUR: Color = Color::srgb(0.1, 0.6, 1.0);
pub const SELECTED_NODE_COLOUR: Color = Color::srgb(1.0, 0.55, 0.0);
pub const WALL_PREVIEW_COLOUR: Color = Color::srgba(0.05, 0.05, 0.05, 0.85);
pub const FLOOR_PREVIEW_COLOUR: Color = Color::srgba(1.0, 1.0, 1.0, 0.6);
pub const BRUSH_PREVIEW_COLOUR: Color = Color::srgba(1.0, 0.2, 0.2, 0.35);

pub const FOOTPRINT_COLOUR: Color = Color::srgba(0.2, 0.45, 1.0, 0.5);
pub const SENSOR_POINT_COLOUR: Color = Color::srgb(1.0, 0.1, 0.6);

/// Length and thickness of the pose frame gizmo axes in metres.
pub const GIZMO_AXIS_LENGTH: f32 = 0.4;
pub const GIZMO_AXIS_WIDTH: f32 = 0.025;

pub const CLEAR_COLOUR: Color = Color::srgb(0.12, 0.12, 0.14);
