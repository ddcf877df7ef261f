use crate::engine::assets::robot_model::RobotModel;
use bevy::prelude::*;

/// Candidate robot pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEstimate {
    pub position: Vec3,
    /// Always unit length.
    pub orientation: Quat,
    /// Seconds since the Unix epoch of the last commit, 0 before the first.
    pub timestamp: f64,
}

impl Default for PoseEstimate {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            timestamp: 0.0,
        }
    }
}

impl PoseEstimate {
    pub fn from_planar(x: f32, y: f32, yaw: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            orientation: Quat::from_axis_angle(Vec3::Z, yaw),
            timestamp: 0.0,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Rotation about Z, read back from the decomposed pose matrix.
    pub fn yaw(&self) -> f32 {
        let (_, rotation, _) = self.matrix().to_scale_rotation_translation();
        rotation.to_euler(EulerRot::ZYX).0
    }
}

/// Geometry derived from a pose and the robot model.
///
/// Recomputed from scratch on every pose change; nothing here is edited directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseVisuals {
    pub base: Mat4,
    /// Footprint corners in the map frame.
    pub footprint: Vec<Vec2>,
    /// Sensor pose: `base * sensor_to_base`.
    pub sensor: Transform,
    /// Sensor cloud in the map frame.
    pub cloud: Vec<Vec3>,
    /// Frame gizmo placed at the base.
    pub gizmo: Transform,
}

impl PoseVisuals {
    pub fn derive(pose: &PoseEstimate, robot: &RobotModel) -> Self {
        let base = pose.matrix();
        let footprint = robot
            .footprint
            .iter()
            .map(|p| base.transform_point3(p.extend(0.0)).truncate())
            .collect();

        let sensor_matrix = base * robot.sensor_to_base.compute_matrix();
        let (_, sensor_rotation, sensor_translation) = sensor_matrix.to_scale_rotation_translation();
        let cloud = robot
            .sensor_cloud
            .iter()
            .map(|p| sensor_matrix.transform_point3(*p))
            .collect();

        Self {
            base,
            footprint,
            sensor: Transform {
                translation: sensor_translation,
                rotation: sensor_rotation,
                scale: Vec3::ONE,
            },
            cloud,
            gizmo: Transform::from_translation(pose.position).with_rotation(pose.orientation),
        }
    }
}
