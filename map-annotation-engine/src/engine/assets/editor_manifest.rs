use crate::engine::assets::robot_model::RobotModelConfig;
use crate::tools::records::ZoneRecord;
use crate::tools::settings::ToolSettings;
use bevy::prelude::*;
use constants::path::RELATIVE_MANIFEST_PATH;
use serde::{Deserialize, Serialize};

/// Map raster reference with its map_server style geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSource {
    /// Raster file relative to the manifest directory.
    pub image: String,
    /// Metres per pixel.
    pub resolution: f32,
    /// `[x, y, yaw]` of the lower-left pixel. Yaw must be zero.
    #[serde(default)]
    pub origin: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIds {
    pub map_id: String,
    pub site_id: String,
}

/// Editing session description as a Bevy asset. Mirrors the JSON structure.
///
/// ```json
/// {
///   "map": { "image": "office.pgm", "resolution": 0.05, "origin": [-10.0, -10.0, 0.0] },
///   "session": { "map_id": "office", "site_id": "hq" },
///   "robot": { "footprint": [[-0.3, -0.2], [0.3, -0.2], [0.3, 0.2], [-0.3, 0.2]] },
///   "tools": [{ "tool": "wall", "width_px": 4 }]
/// }
/// ```
#[derive(Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorManifest {
    pub map: MapSource,
    pub session: SessionIds,
    #[serde(default)]
    pub robot: RobotModelConfig,
    #[serde(default)]
    pub tools: Vec<ToolSettings>,
    /// Zones committed in earlier sessions.
    #[serde(default)]
    pub zones: Vec<ZoneRecord>,
}

impl EditorManifest {
    /// Asset path of the map raster.
    pub fn map_asset_path(&self) -> String {
        format!("{}/{}", RELATIVE_MANIFEST_PATH, self.map.image)
    }

    pub fn origin(&self) -> Vec2 {
        let [x, y, yaw] = self.map.origin;
        if yaw.abs() > f32::EPSILON {
            warn!("Rotated map origins are not supported, ignoring yaw {}", yaw);
        }
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::settings::ToolSettingsSet;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "map": { "image": "office.pgm", "resolution": 0.05, "origin": [-10.0, -5.0, 0.0] },
        "session": { "map_id": "office", "site_id": "hq" },
        "robot": {
            "footprint": [[-0.3, -0.2], [0.3, -0.2], [0.3, 0.2], [-0.3, 0.2]]
        },
        "tools": [
            { "tool": "wall", "width_px": 6 },
            { "tool": "pose_estimate", "initial_pose": [1.0, 2.0, 0.5] }
        ]
    }"#;

    #[test]
    fn parses_a_complete_manifest() {
        let manifest: EditorManifest = serde_json::from_str(MANIFEST).unwrap();

        assert_eq!(manifest.map_asset_path(), "maps/demo/office.pgm");
        assert_eq!(manifest.origin(), Vec2::new(-10.0, -5.0));
        assert_eq!(manifest.session.site_id, "hq");
        assert_eq!(manifest.robot.footprint.len(), 4);
        assert!(manifest.zones.is_empty());

        let settings = ToolSettingsSet::from_entries(&manifest.tools);
        assert_eq!(settings.wall.width_px, 6);
        assert_eq!(settings.pose.initial_pose, [1.0, 2.0, 0.5]);
    }

    #[test]
    fn unknown_tool_entries_are_rejected() {
        let broken = MANIFEST.replace("pose_estimate", "lasso");
        assert!(serde_json::from_str::<EditorManifest>(&broken).is_err());
    }
}
