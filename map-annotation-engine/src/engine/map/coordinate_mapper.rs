use crate::engine::map::occupancy_grid::MapInfo;
use bevy::prelude::*;
use constants::coordinate_system::{MAP_PLANE_Z, RAY_PARALLEL_EPSILON};

/// Screen → world → pixel conversions for the loaded map.
///
/// Every tool resolves coordinates through this type so brush strokes, wall
/// lines and polygon fills agree pixel for pixel. Intersections are returned
/// unsmoothed: the same screen point always lands on the same pixel.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    info: MapInfo,
}

impl CoordinateMapper {
    pub fn new(info: MapInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    /// Cast a ray from `camera` through a viewport position and intersect it with
    /// the map surface. `None` when the ray misses the plane or lands outside the map.
    pub fn screen_to_world(
        &self,
        camera: &Camera,
        camera_transform: &GlobalTransform,
        screen: Vec2,
    ) -> Option<Vec2> {
        let ray = camera.viewport_to_world(camera_transform, screen).ok()?;
        self.ray_to_world(ray)
    }

    pub fn ray_to_world(&self, ray: Ray3d) -> Option<Vec2> {
        if ray.direction.z.abs() < RAY_PARALLEL_EPSILON {
            return None;
        }

        let distance = ray.intersect_plane(
            Vec3::new(0.0, 0.0, MAP_PLANE_Z),
            InfinitePlane3d { normal: Dir3::Z },
        )?;
        let world = ray.get_point(distance).truncate();

        self.contains_world(world).then_some(world)
    }

    /// `floor((w - origin) / resolution)` per axis.
    pub fn world_to_pixel(&self, world: Vec2) -> IVec2 {
        self.world_to_pixel_f(world).floor().as_ivec2()
    }

    /// Continuous pixel coordinates; pixel `i` spans `[i, i + 1)` with its centre at `i + 0.5`.
    pub fn world_to_pixel_f(&self, world: Vec2) -> Vec2 {
        (world - self.info.origin) / self.info.resolution
    }

    /// World position of a pixel centre.
    pub fn pixel_to_world(&self, pixel: IVec2) -> Vec2 {
        self.info.origin + (pixel.as_vec2() + Vec2::splat(0.5)) * self.info.resolution
    }

    pub fn contains_pixel(&self, pixel: IVec2) -> bool {
        pixel.x >= 0
            && pixel.y >= 0
            && (pixel.x as u32) < self.info.width
            && (pixel.y as u32) < self.info.height
    }

    pub fn contains_world(&self, world: Vec2) -> bool {
        self.contains_pixel(self.world_to_pixel(world))
    }

    pub fn metres_to_pixels(&self, metres: f32) -> f32 {
        metres / self.info.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(MapInfo::new(100, 100, 0.05, Vec2::new(-2.0, -1.0)).unwrap())
    }

    #[test]
    fn world_to_pixel_floors_relative_to_origin() {
        let mapper = mapper();
        assert_eq!(mapper.world_to_pixel(Vec2::new(-2.0, -1.0)), IVec2::ZERO);
        assert_eq!(mapper.world_to_pixel(Vec2::new(-1.99, -0.96)), IVec2::new(0, 0));
        assert_eq!(mapper.world_to_pixel(Vec2::new(-1.94, -0.94)), IVec2::new(1, 1));
        assert_eq!(mapper.world_to_pixel(Vec2::new(-2.01, -1.01)), IVec2::new(-1, -1));
    }

    #[test]
    fn pixel_centres_map_back_to_the_same_pixel() {
        let mapper = mapper();
        for pixel in [IVec2::new(0, 0), IVec2::new(17, 42), IVec2::new(99, 99)] {
            assert_eq!(mapper.world_to_pixel(mapper.pixel_to_world(pixel)), pixel);
        }
    }

    fn ray(origin: Vec3, direction: Dir3) -> Ray3d {
        Ray3d { origin, direction }
    }

    #[test]
    fn downward_rays_hit_the_map_plane() {
        let mapper = mapper();
        let world = mapper
            .ray_to_world(ray(Vec3::new(0.3, 0.2, 10.0), Dir3::NEG_Z))
            .unwrap();
        assert!((world - Vec2::new(0.3, 0.2)).length() < 1e-5);
    }

    #[test]
    fn rays_that_miss_resolve_to_none() {
        let mapper = mapper();
        let above = Vec3::new(0.0, 0.0, 1.0);
        // Parallel to the plane.
        assert_eq!(mapper.ray_to_world(ray(above, Dir3::X)), None);
        // Pointing away from the plane.
        assert_eq!(mapper.ray_to_world(ray(above, Dir3::Z)), None);
        // Hits the plane outside the map extent.
        assert_eq!(
            mapper.ray_to_world(ray(Vec3::new(50.0, 0.0, 1.0), Dir3::NEG_Z)),
            None
        );
    }

    #[test]
    fn identical_rays_resolve_identically() {
        let mapper = mapper();
        let cast = ray(Vec3::new(0.123, -0.456, 3.0), Dir3::NEG_Z);
        let first = mapper.ray_to_world(cast).map(|w| mapper.world_to_pixel(w));
        let second = mapper.ray_to_world(cast).map(|w| mapper.world_to_pixel(w));
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
