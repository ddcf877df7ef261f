//! Pose estimate overlay: the candidate robot pose, its derived geometry and
//! the systems that keep the overlay meshes in sync.

pub mod tool;
pub mod visuals;

use crate::engine::assets::robot_model::RobotModel;
use crate::tools::map_tool::MapTool;
use crate::tools::preview::{clear_preview, PreviewBuilder};
use bevy::prelude::*;
use constants::coordinate_system::POSE_OVERLAY_Z;
use constants::render_settings::{
    FOOTPRINT_COLOUR, GIZMO_AXIS_LENGTH, GIZMO_AXIS_WIDTH, SENSOR_POINT_COLOUR,
};
use tool::PoseEstimateTool;

#[derive(Component, Clone)]
pub struct PoseOverlay;

/// Feed app time into the tool so commits carry wall-clock timestamps.
pub fn advance_pose_clock(time: Res<Time>, mut tool: ResMut<PoseEstimateTool>) {
    tool.bypass_change_detection()
        .set_elapsed(time.elapsed_secs_f64());
}

/// Re-derive the overlay when the host replaces the sensor cloud.
pub fn refresh_pose_on_robot_change(robot: Res<RobotModel>, mut tool: ResMut<PoseEstimateTool>) {
    if robot.is_changed() && tool.is_enabled() {
        tool.refresh(&robot);
    }
}

pub fn update_pose_overlay(
    mut commands: Commands,
    mut tool: ResMut<PoseEstimateTool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<PoseOverlay>>,
) {
    if !tool.take_visuals_dirty() {
        return;
    }

    clear_preview(&mut commands, &existing);
    let Some(visuals) = tool.visuals().filter(|_| tool.is_enabled()) else {
        return;
    };

    let mut overlay = PreviewBuilder {
        commands: &mut commands,
        meshes: &mut *meshes,
        materials: &mut *materials,
        marker: PoseOverlay,
    };

    overlay.polygon(&visuals.footprint, POSE_OVERLAY_Z, FOOTPRINT_COLOUR);
    overlay.outline(&visuals.footprint, FOOTPRINT_COLOUR.with_alpha(1.0));
    overlay.points(&visuals.cloud, SENSOR_POINT_COLOUR);

    let origin = visuals.gizmo.translation.with_z(POSE_OVERLAY_Z);
    for (axis, colour) in [
        (Vec3::X, Color::srgb(1.0, 0.0, 0.0)),
        (Vec3::Y, Color::srgb(0.0, 1.0, 0.0)),
        (Vec3::Z, Color::srgb(0.0, 0.0, 1.0)),
    ] {
        let tip = origin + visuals.gizmo.rotation * axis * GIZMO_AXIS_LENGTH;
        overlay.edge_with_width(origin, tip, GIZMO_AXIS_WIDTH, colour);
    }

    let sensor = visuals.sensor.translation;
    overlay.sphere(
        sensor.with_z(sensor.z.max(POSE_OVERLAY_Z)),
        GIZMO_AXIS_WIDTH,
        SENSOR_POINT_COLOUR,
    );
}
