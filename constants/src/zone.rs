use crate::occupancy::Rgba;

pub const PREFERRED_ZONE_COLOUR: Rgba = [46, 204, 113, 110];
pub const FORBIDDEN_ZONE_COLOUR: Rgba = [231, 76, 60, 110];
pub const CRITICAL_ZONE_COLOUR: Rgba = [243, 156, 18, 110];

/// Outline width for zone previews in metres.
pub const DEFAULT_ZONE_LINE_WIDTH: f32 = 0.05;
