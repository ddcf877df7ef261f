use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Rigid transform as written in the manifest; rotation is `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransformConfig {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

impl Default for RigidTransformConfig {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: identity_rotation(),
        }
    }
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl RigidTransformConfig {
    pub fn to_transform(&self) -> Transform {
        let rotation = Quat::from_array(self.rotation);
        let rotation = if rotation.length_squared() > f32::EPSILON {
            rotation.normalize()
        } else {
            warn!("Degenerate sensor rotation {:?}, using identity", self.rotation);
            Quat::IDENTITY
        };

        Transform {
            translation: Vec3::from_array(self.translation),
            rotation,
            scale: Vec3::ONE,
        }
    }
}

/// Robot description block of the editor manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotModelConfig {
    /// Footprint outline in the base frame, metres.
    #[serde(default)]
    pub footprint: Vec<[f32; 2]>,
    #[serde(default)]
    pub sensor_to_base: RigidTransformConfig,
    /// Optional static sensor scan in the sensor frame.
    #[serde(default)]
    pub sensor_cloud: Vec<[f32; 3]>,
}

/// The robot the pose estimate is placed for.
///
/// The footprint and sensor mount are fixed; the sensor cloud can be replaced
/// at runtime when the host streams a new scan.
#[derive(Resource, Debug, Clone, PartialEq, Default)]
pub struct RobotModel {
    pub footprint: Vec<Vec2>,
    pub sensor_to_base: Transform,
    pub sensor_cloud: Vec<Vec3>,
}

impl RobotModel {
    pub fn from_config(config: &RobotModelConfig) -> Self {
        let model = Self {
            footprint: config.footprint.iter().map(|p| Vec2::from_array(*p)).collect(),
            sensor_to_base: config.sensor_to_base.to_transform(),
            sensor_cloud: config.sensor_cloud.iter().map(|p| Vec3::from_array(*p)).collect(),
        };
        if !model.has_footprint() {
            warn!(
                "Robot footprint has {} points; pose estimation is disabled",
                model.footprint.len()
            );
        }
        model
    }

    pub fn has_footprint(&self) -> bool {
        self.footprint.len() >= 3
    }

    pub fn set_sensor_cloud(&mut self, points: Vec<Vec3>) {
        debug!("Sensor cloud replaced ({} points)", points.len());
        self.sensor_cloud = points;
    }
}
