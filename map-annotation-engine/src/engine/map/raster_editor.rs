//! Brush, line and polygon writes into an [`OccupancyGrid`].
//!
//! All writes clip per pixel against the grid bounds and set the grid's dirty
//! flag only when at least one pixel actually changed.

use crate::engine::map::occupancy_grid::OccupancyGrid;
use bevy::prelude::*;
use constants::occupancy::{OCCUPIED, Rgba};

/// Which pixels a brush is allowed to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushPredicate {
    /// Overwrite anything (floor eraser).
    Always,
    /// Only overwrite pixels that are exactly the occupied colour (wall eraser).
    OnlyOccupied,
}

impl BrushPredicate {
    pub fn accepts(self, current: Rgba) -> bool {
        match self {
            Self::Always => true,
            Self::OnlyOccupied => current == OCCUPIED,
        }
    }
}

/// Paint every pixel within `radius` metres of `centre` that passes `predicate`.
///
/// Distances are measured between pixel indices, so the footprint is the
/// discrete disc around the centre pixel. Returns the number of pixels changed.
pub fn apply_circular_brush(
    grid: &mut OccupancyGrid,
    centre: Vec2,
    radius: f32,
    predicate: BrushPredicate,
    colour: Rgba,
) -> usize {
    let mapper = grid.mapper();
    let centre_px = mapper.world_to_pixel(centre);
    let radius_px = mapper.metres_to_pixels(radius).max(0.0);
    let reach = radius_px.ceil() as i32;
    let radius_sq = radius_px * radius_px;

    let mut changed = 0;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if (dx * dx + dy * dy) as f32 > radius_sq {
                continue;
            }

            let pixel = centre_px + IVec2::new(dx, dy);
            let Some(current) = grid.pixel(pixel) else {
                continue;
            };
            if predicate.accepts(current) && grid.put_pixel(pixel, colour) {
                changed += 1;
            }
        }
    }

    if changed > 0 {
        grid.mark_dirty();
    }
    changed
}

/// Paint the `(2 * half_width + 1)` pixel square centred on `centre`.
pub fn paint_square(grid: &mut OccupancyGrid, centre: IVec2, half_width: i32, colour: Rgba) -> usize {
    let mut changed = 0;
    for dy in -half_width..=half_width {
        for dx in -half_width..=half_width {
            if grid.put_pixel(centre + IVec2::new(dx, dy), colour) {
                changed += 1;
            }
        }
    }

    if changed > 0 {
        grid.mark_dirty();
    }
    changed
}

/// Rasterise a straight wall between two world points.
///
/// Walks the pixel-space line in unit steps and stamps a square of half-width
/// `ceil(width_px / 2)` at each step. The stamp is clipped to the segment's
/// extent along its direction so the ends are square and stop at the endpoint
/// pixels.
pub fn rasterize_line(
    grid: &mut OccupancyGrid,
    start: Vec2,
    end: Vec2,
    width_px: u32,
    colour: Rgba,
) -> usize {
    let mapper = grid.mapper();
    let start_px = mapper.world_to_pixel(start).as_vec2();
    let end_px = mapper.world_to_pixel(end).as_vec2();
    let half_width = width_px.div_ceil(2) as i32;

    let delta = end_px - start_px;
    let distance = delta.length();
    let direction = delta.normalize_or_zero();
    let steps = distance.ceil() as i32;

    if direction == Vec2::ZERO {
        return paint_square(grid, start_px.as_ivec2(), half_width, colour);
    }

    let mut changed = 0;
    for step in 0..=steps {
        let along = (step as f32).min(distance);
        let centre = (start_px + direction * along).round().as_ivec2();

        for dy in -half_width..=half_width {
            for dx in -half_width..=half_width {
                let pixel = centre + IVec2::new(dx, dy);
                let projection = (pixel.as_vec2() - start_px).dot(direction);
                if projection < -0.5 || projection > distance + 0.5 {
                    continue;
                }

                if grid.put_pixel(pixel, colour) {
                    changed += 1;
                }
            }
        }
    }

    if changed > 0 {
        grid.mark_dirty();
    }
    changed
}

/// Fill the interior of a world-space polygon.
///
/// Pixel centres are tested with [`point_in_polygon`] over the polygon's
/// bounding box only. Polygons with fewer than three points are ignored.
pub fn fill_polygon(grid: &mut OccupancyGrid, points: &[Vec2], colour: Rgba) -> usize {
    if points.len() < 3 {
        return 0;
    }

    let mapper = grid.mapper();
    let polygon: Vec<Vec2> = points.iter().map(|p| mapper.world_to_pixel_f(*p)).collect();

    let (min, max) = polygon.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    let min_px = min.floor().as_ivec2().max(IVec2::ZERO);
    let max_px = max
        .ceil()
        .as_ivec2()
        .min(IVec2::new(grid.width() as i32 - 1, grid.height() as i32 - 1));

    let mut changed = 0;
    for iy in min_px.y..=max_px.y {
        for ix in min_px.x..=max_px.x {
            let centre = Vec2::new(ix as f32 + 0.5, iy as f32 + 0.5);
            if point_in_polygon(centre, &polygon) && grid.put_pixel(IVec2::new(ix, iy), colour) {
                changed += 1;
            }
        }
    }

    if changed > 0 {
        grid.mark_dirty();
    }
    changed
}

/// Even-odd crossing test.
///
/// An edge `(i, j)` counts when `(yi > y) != (yj > y)` and the point lies left
/// of the edge's x at height `y`. The strict comparison makes horizontal edges
/// half-open, so a point on an edge shared by two adjacent polygons is inside
/// exactly one of them.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::occupancy_grid::MapInfo;
    use constants::occupancy::FREE;

    fn grid(size: u32) -> OccupancyGrid {
        OccupancyGrid::filled(MapInfo::new(size, size, 0.05, Vec2::ZERO).unwrap(), FREE)
    }

    #[test]
    fn brush_is_idempotent() {
        let mut once = grid(40);
        apply_circular_brush(&mut once, Vec2::new(1.0, 1.0), 0.3, BrushPredicate::Always, OCCUPIED);

        let mut twice = once.clone();
        let changed =
            apply_circular_brush(&mut twice, Vec2::new(1.0, 1.0), 0.3, BrushPredicate::Always, OCCUPIED);

        assert_eq!(changed, 0);
        assert_eq!(once.as_raw(), twice.as_raw());
    }

    #[test]
    fn brush_covers_a_disc_and_clips_at_edges() {
        let mut g = grid(40);
        // Radius of two pixels: 13 lattice points within distance 2.
        let changed =
            apply_circular_brush(&mut g, Vec2::new(1.0, 1.0), 0.1, BrushPredicate::Always, OCCUPIED);
        assert_eq!(changed, 13);

        let mut corner = grid(40);
        let changed = apply_circular_brush(
            &mut corner,
            Vec2::new(0.01, 0.01),
            0.1,
            BrushPredicate::Always,
            OCCUPIED,
        );
        // Quarter disc including the axes: 6 pixels stay in bounds.
        assert_eq!(changed, 6);
    }

    #[test]
    fn only_occupied_predicate_skips_other_pixels() {
        let mut g = grid(20);
        g.put_pixel(IVec2::new(10, 10), OCCUPIED);
        g.put_pixel(IVec2::new(11, 10), [205, 205, 205, 255]);

        let changed = apply_circular_brush(
            &mut g,
            Vec2::new(0.525, 0.525),
            0.2,
            BrushPredicate::OnlyOccupied,
            FREE,
        );

        assert_eq!(changed, 1);
        assert_eq!(g.pixel(IVec2::new(10, 10)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(11, 10)), Some([205, 205, 205, 255]));
    }

    #[test]
    fn untouched_grid_stays_clean() {
        let mut g = grid(20);
        g.take_dirty();
        apply_circular_brush(&mut g, Vec2::new(0.5, 0.5), 0.2, BrushPredicate::OnlyOccupied, FREE);
        assert!(!g.is_dirty());
    }

    #[test]
    fn vertical_line_has_square_ends() {
        let mut g = grid(40);
        rasterize_line(&mut g, Vec2::new(1.0, 0.5), Vec2::new(1.0, 1.0), 2, OCCUPIED);

        // Pixels x 19..=21, y 10..=20.
        assert_eq!(g.count_colour(OCCUPIED), 3 * 11);
        assert_eq!(g.pixel(IVec2::new(20, 9)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(20, 21)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(18, 15)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(21, 15)), Some(OCCUPIED));
    }

    #[test]
    fn degenerate_line_stamps_one_square() {
        let mut g = grid(40);
        rasterize_line(&mut g, Vec2::new(1.0, 1.0), Vec2::new(1.01, 1.01), 4, OCCUPIED);
        assert_eq!(g.count_colour(OCCUPIED), 25);
    }

    #[test]
    fn diagonal_line_is_connected() {
        let mut g = grid(40);
        rasterize_line(&mut g, Vec2::new(0.1, 0.1), Vec2::new(1.5, 1.2), 1, OCCUPIED);
        let mapper = g.mapper();
        for t in 0..=10 {
            let p = Vec2::new(0.1, 0.1).lerp(Vec2::new(1.5, 1.2), t as f32 / 10.0);
            assert_eq!(g.pixel(mapper.world_to_pixel(p)), Some(OCCUPIED), "gap at {p}");
        }
    }

    #[test]
    fn polygon_fill_needs_three_points() {
        let mut g = grid(20);
        let changed = fill_polygon(&mut g, &[Vec2::ZERO, Vec2::new(1.0, 1.0)], OCCUPIED);
        assert_eq!(changed, 0);
        assert_eq!(g.count_colour(OCCUPIED), 0);
    }

    #[test]
    fn triangle_fill_stays_inside_its_bounding_box() {
        let mut g = grid(40);
        let triangle = [Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5), Vec2::new(0.5, 1.5)];
        let changed = fill_polygon(&mut g, &triangle, OCCUPIED);

        // Right triangle with 20 px legs: rows hold 19, 18, ... 1 pixel centres,
        // centres on the hypotenuse fall outside.
        assert_eq!(changed, 190);
        assert_eq!(g.pixel(IVec2::new(10, 10)), Some(OCCUPIED));
        assert_eq!(g.pixel(IVec2::new(29, 29)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(9, 10)), Some(FREE));
    }

    #[test]
    fn shared_horizontal_edge_belongs_to_one_polygon() {
        let lower = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let upper = [
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];

        for x in [0.5, 2.5, 5.0, 9.5] {
            let on_edge = Vec2::new(x, 10.0);
            assert!(
                point_in_polygon(on_edge, &lower) != point_in_polygon(on_edge, &upper),
                "point {on_edge} claimed by both or neither"
            );
        }
    }
}
