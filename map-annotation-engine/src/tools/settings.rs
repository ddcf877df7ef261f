use crate::tools::records::ZoneKind;
use bevy::prelude::*;
use constants::tools::{
    DEFAULT_FLOOR_BRUSH_RADIUS, DEFAULT_NODE_RADIUS, DEFAULT_WALL_ERASER_RADIUS,
    DEFAULT_WALL_WIDTH_PX, MIN_BRUSH_RADIUS,
};
use constants::zone::DEFAULT_ZONE_LINE_WIDTH;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Per-tool configuration as it appears in the editor manifest, tagged by `"tool"`.
///
/// ```json
/// { "tool": "wall", "width_px": 4, "node_radius": 0.15 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolSettings {
    Wall(WallSettings),
    Floor(FloorSettings),
    Zone(ZoneSettings),
    PoseEstimate(PoseSettings),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSettings {
    /// Stroke width in map pixels.
    #[serde(deserialize_with = "positive_u32")]
    pub width_px: u32,
    #[serde(deserialize_with = "positive_f32")]
    pub node_radius: f32,
    #[serde(deserialize_with = "brush_radius")]
    pub eraser_radius: f32,
}

impl Default for WallSettings {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_WALL_WIDTH_PX,
            node_radius: DEFAULT_NODE_RADIUS,
            eraser_radius: DEFAULT_WALL_ERASER_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorSettings {
    #[serde(deserialize_with = "positive_f32")]
    pub node_radius: f32,
    #[serde(deserialize_with = "brush_radius")]
    pub brush_radius: f32,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            node_radius: DEFAULT_NODE_RADIUS,
            brush_radius: DEFAULT_FLOOR_BRUSH_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    #[serde(deserialize_with = "positive_f32")]
    pub node_radius: f32,
    pub default_kind: ZoneKind,
    #[serde(deserialize_with = "positive_f32")]
    pub line_width: f32,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            node_radius: DEFAULT_NODE_RADIUS,
            default_kind: ZoneKind::default(),
            line_width: DEFAULT_ZONE_LINE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PoseSettings {
    /// Starting pose as `[x, y, yaw]`.
    pub initial_pose: [f32; 3],
}

/// Resolved settings for every tool, defaults filled in.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolSettingsSet {
    pub wall: WallSettings,
    pub floor: FloorSettings,
    pub zone: ZoneSettings,
    pub pose: PoseSettings,
}

impl ToolSettingsSet {
    /// Later entries for the same tool override earlier ones.
    pub fn from_entries(entries: &[ToolSettings]) -> Self {
        entries.iter().fold(Self::default(), |mut set, entry| {
            match entry {
                ToolSettings::Wall(wall) => set.wall = *wall,
                ToolSettings::Floor(floor) => set.floor = *floor,
                ToolSettings::Zone(zone) => set.zone = *zone,
                ToolSettings::PoseEstimate(pose) => set.pose = *pose,
            }
            set
        })
    }
}

fn positive_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(D::Error::custom(format!(
            "expected a positive number, got {value}"
        )))
    }
}

fn brush_radius<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = positive_f32(deserializer)?;
    if value < MIN_BRUSH_RADIUS {
        return Err(D::Error::custom(format!(
            "brush radius {value} is below the minimum of {MIN_BRUSH_RADIUS}"
        )));
    }
    Ok(value)
}

fn positive_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = u32::deserialize(deserializer)?;
    if value == 0 {
        return Err(D::Error::custom("expected a width of at least one pixel"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entries_are_tagged_by_tool() {
        let entries: Vec<ToolSettings> = serde_json::from_str(
            r#"[
                { "tool": "wall", "width_px": 6 },
                { "tool": "floor", "brush_radius": 0.5 },
                { "tool": "zone", "default_kind": "forbidden" },
                { "tool": "pose_estimate", "initial_pose": [1.0, 2.0, 0.5] }
            ]"#,
        )
        .unwrap();

        let set = ToolSettingsSet::from_entries(&entries);
        assert_eq!(set.wall.width_px, 6);
        assert_eq!(set.wall.node_radius, DEFAULT_NODE_RADIUS);
        assert_eq!(set.floor.brush_radius, 0.5);
        assert_eq!(set.zone.default_kind, ZoneKind::Forbidden);
        assert_eq!(set.pose.initial_pose, [1.0, 2.0, 0.5]);
    }

    #[test]
    fn unknown_tools_are_rejected() {
        let result = serde_json::from_str::<ToolSettings>(r#"{ "tool": "laser" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        for json in [
            r#"{ "tool": "wall", "width_px": 0 }"#,
            r#"{ "tool": "wall", "node_radius": -1.0 }"#,
            r#"{ "tool": "floor", "brush_radius": 0.0 }"#,
            r#"{ "tool": "floor", "brush_radius": 0.0001 }"#,
            r#"{ "tool": "zone", "default_kind": "lava" }"#,
        ] {
            assert!(
                serde_json::from_str::<ToolSettings>(json).is_err(),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn missing_entries_fall_back_to_defaults() {
        assert_eq!(ToolSettingsSet::from_entries(&[]), ToolSettingsSet::default());
    }
}
