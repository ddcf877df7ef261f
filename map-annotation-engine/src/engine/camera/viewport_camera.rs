use crate::engine::core::resize::Resizable;
use crate::engine::map::occupancy_grid::MapInfo;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use constants::coordinate_system::MAP_PLANE_Z;
use std::f32::consts::FRAC_PI_4;

/// Marks the camera used for map ray casts.
#[derive(Component)]
pub struct MapCamera;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportCamera {
    /// Map-plane point under the viewport centre.
    pub focus_point: Vec2,
    /// Distance above the map plane.
    pub height: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub viewport_size: Vec2,
    pub is_panning: bool,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec2::ZERO,
            height: 10.0,
            min_height: 0.5,
            max_height: 500.0,
            fov: FRAC_PI_4,
            viewport_size: Vec2::new(1280.0, 720.0),
            is_panning: false,
        }
    }
}

impl ViewportCamera {
    /// Frame the whole map with a small margin.
    pub fn with_map(info: &MapInfo) -> Self {
        let defaults = Self::default();
        let size = info.world_size();
        let aspect = defaults.viewport_size.x / defaults.viewport_size.y;
        let half_extent = (size.y * 0.5).max(size.x * 0.5 / aspect);
        let height = half_extent * 1.1 / (defaults.fov * 0.5).tan();

        Self {
            focus_point: info.world_center(),
            height: height.clamp(defaults.min_height, defaults.max_height),
            max_height: defaults.max_height.max(height * 4.0),
            ..defaults
        }
    }

    /// Map metres covered by one viewport pixel at the current height.
    pub fn world_per_pixel(&self) -> f32 {
        2.0 * self.height * (self.fov * 0.5).tan() / self.viewport_size.y.max(1.0)
    }

    /// Drag the map by a cursor delta in viewport pixels (y down).
    pub fn pan_by_pixels(&mut self, delta: Vec2) {
        let scale = self.world_per_pixel();
        self.focus_point.x -= delta.x * scale;
        self.focus_point.y += delta.y * scale;
    }

    /// Zoom by scroll lines; positive scrolls move closer.
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * 0.1).clamp(0.5, 1.5);
        self.height = (self.height * factor).clamp(self.min_height, self.max_height);
    }

    pub fn transform(&self) -> Transform {
        let focus = self.focus_point.extend(MAP_PLANE_Z);
        Transform::from_translation(focus + Vec3::Z * self.height).looking_at(focus, Vec3::Y)
    }
}

impl Resizable for ViewportCamera {
    fn on_resize(&mut self, size: Vec2) {
        self.viewport_size = size;
    }
}

pub fn spawn_map_camera(commands: &mut Commands, viewport: &ViewportCamera) {
    commands.spawn((
        MapCamera,
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: viewport.fov,
            ..default()
        }),
        // Map colours must reach the screen unchanged.
        Tonemapping::None,
        viewport.transform(),
    ));
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<MapCamera>>,
    viewport: Option<ResMut<ViewportCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time>,
) {
    let Some(mut viewport) = viewport else {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    };
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    viewport.is_panning = mouse_button.pressed(MouseButton::Right);
    if viewport.is_panning && mouse_delta != Vec2::ZERO {
        viewport.pan_by_pixels(mouse_delta);
    }

    // Mouse wheel scroll accumulation (pixel and line scroll)
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        viewport.zoom(scroll_accum);
    }

    let target = viewport.transform();
    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = target.rotation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_centres_on_the_map() {
        let info = MapInfo::new(200, 100, 0.05, Vec2::new(-1.0, -2.0)).unwrap();
        let viewport = ViewportCamera::with_map(&info);

        assert_eq!(viewport.focus_point, Vec2::new(4.0, 0.5));
        let visible_height = viewport.world_per_pixel() * viewport.viewport_size.y;
        assert!(visible_height * viewport.viewport_size.x / viewport.viewport_size.y >= 10.0);
    }

    #[test]
    fn pan_follows_the_cursor() {
        let mut viewport = ViewportCamera::default();
        let scale = viewport.world_per_pixel();
        viewport.pan_by_pixels(Vec2::new(10.0, 10.0));

        assert!((viewport.focus_point.x + 10.0 * scale).abs() < 1e-6);
        assert!((viewport.focus_point.y - 10.0 * scale).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = ViewportCamera::default();
        for _ in 0..100 {
            viewport.zoom(5.0);
        }
        assert_eq!(viewport.height, viewport.min_height);
    }

    #[test]
    fn camera_looks_straight_down() {
        let viewport = ViewportCamera::default();
        let forward = viewport.transform().forward();
        assert!(forward.dot(Vec3::NEG_Z) > 0.9999);
    }
}
