use crate::tools::nodes::NodeList;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use constants::coordinate_system::PREVIEW_Z;
use constants::render_settings::{
    DRAW_LINE_WIDTH, DRAW_VERTEX_SIZE, NODE_COLOUR, SELECTED_NODE_COLOUR, SELECTED_VERTEX_SIZE,
};

/// Spawns unlit preview geometry tagged with a tool's marker component.
///
/// Preview entities are cheap and short lived: tools despawn and rebuild them
/// whenever their visuals are marked dirty.
pub struct PreviewBuilder<'a, 'w, 's, M: Component + Clone> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub marker: M,
}

impl<M: Component + Clone> PreviewBuilder<'_, '_, '_, M> {
    pub fn node_markers(&mut self, nodes: &NodeList, selected: Option<usize>) {
        for (index, node) in nodes.iter().enumerate() {
            let (size, colour) = if Some(index) == selected {
                (SELECTED_VERTEX_SIZE, SELECTED_NODE_COLOUR)
            } else {
                (DRAW_VERTEX_SIZE, NODE_COLOUR)
            };
            self.sphere(node.position.extend(PREVIEW_Z), size, colour);
        }
    }

    pub fn sphere(&mut self, position: Vec3, radius: f32, colour: Color) {
        self.commands.spawn((
            Mesh3d(self.meshes.add(Sphere::new(radius))),
            MeshMaterial3d(self.materials.add(unlit_material(colour))),
            Transform::from_translation(position),
            self.marker.clone(),
        ));
    }

    /// Thin box between two points on the preview layer.
    pub fn edge(&mut self, start: Vec2, end: Vec2, colour: Color) {
        self.edge_with_width(
            start.extend(PREVIEW_Z),
            end.extend(PREVIEW_Z),
            DRAW_LINE_WIDTH,
            colour,
        );
    }

    pub fn edge_with_width(&mut self, start: Vec3, end: Vec3, width: f32, colour: Color) {
        let direction = end - start;
        let distance = direction.length();
        if distance <= f32::EPSILON {
            return;
        }

        let rotation = Quat::from_rotation_arc(Vec3::X, direction / distance);
        self.commands.spawn((
            Mesh3d(self.meshes.add(Cuboid::new(distance, width, width))),
            MeshMaterial3d(self.materials.add(unlit_material(colour))),
            Transform::from_translation((start + end) * 0.5).with_rotation(rotation),
            self.marker.clone(),
        ));
    }

    /// Closed outline through `points`.
    pub fn outline(&mut self, points: &[Vec2], colour: Color) {
        self.outline_with_width(points, DRAW_LINE_WIDTH, colour);
    }

    pub fn outline_with_width(&mut self, points: &[Vec2], width: f32, colour: Color) {
        for (start, end) in outline_edges(points) {
            self.edge_with_width(
                start.extend(PREVIEW_Z),
                end.extend(PREVIEW_Z),
                width,
                colour,
            );
        }
    }

    /// Flat filled polygon at height `z`.
    pub fn polygon(&mut self, points: &[Vec2], z: f32, colour: Color) {
        if points.len() < 3 {
            return;
        }
        self.commands.spawn((
            Mesh3d(self.meshes.add(create_polygon_mesh(points, z))),
            MeshMaterial3d(self.materials.add(unlit_material(colour))),
            Transform::IDENTITY,
            self.marker.clone(),
        ));
    }

    /// Point list in world space, one vertex per point.
    pub fn points(&mut self, points: &[Vec3], colour: Color) {
        if points.is_empty() {
            return;
        }
        self.commands.spawn((
            Mesh3d(self.meshes.add(create_point_mesh(points))),
            MeshMaterial3d(self.materials.add(unlit_material(colour))),
            Transform::IDENTITY,
            self.marker.clone(),
        ));
    }

    pub fn disc(&mut self, centre: Vec2, radius: f32, colour: Color) {
        self.commands.spawn((
            Mesh3d(self.meshes.add(Circle::new(radius))),
            MeshMaterial3d(self.materials.add(unlit_material(colour))),
            Transform::from_translation(centre.extend(PREVIEW_Z)),
            self.marker.clone(),
        ));
    }
}

pub fn unlit_material(colour: Color) -> StandardMaterial {
    let alpha_mode = if colour.alpha() < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    };

    StandardMaterial {
        base_color: colour,
        unlit: true,
        alpha_mode,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

/// Edges of the closed loop through `points`; empty below two points.
pub fn outline_edges(points: &[Vec2]) -> Vec<(Vec2, Vec2)> {
    if points.len() < 2 {
        return Vec::new();
    }
    points
        .iter()
        .enumerate()
        .map(|(i, start)| (*start, points[(i + 1) % points.len()]))
        .collect()
}

fn signed_area(points: &[Vec2]) -> f32 {
    outline_edges(points)
        .iter()
        .map(|(a, b)| a.perp_dot(*b))
        .sum::<f32>()
        * 0.5
}

fn inside_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b - a).perp_dot(p - a) >= 0.0
        && (c - b).perp_dot(p - b) >= 0.0
        && (a - c).perp_dot(p - c) >= 0.0
}

/// Ear-clipping triangulation of a simple polygon in either winding.
///
/// Returns counter-clockwise index triples. Clipping stops early when no ear
/// is left, which only happens for self-intersecting outlines; the fill then
/// covers the part clipped so far.
pub fn triangulate_polygon(points: &[Vec2]) -> Vec<u32> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    if signed_area(points) < 0.0 {
        remaining.reverse();
    }

    let mut indices = Vec::with_capacity(points.len().saturating_sub(2) * 3);
    while remaining.len() > 3 {
        let count = remaining.len();
        let ear = (0..count).find(|&i| {
            let (ia, ib, ic) = (
                remaining[(i + count - 1) % count],
                remaining[i],
                remaining[(i + 1) % count],
            );
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            if (b - a).perp_dot(c - b) <= 0.0 {
                return false;
            }
            remaining
                .iter()
                .filter(|&&j| j != ia && j != ib && j != ic)
                .all(|&j| !inside_triangle(points[j], a, b, c))
        });

        let Some(i) = ear else {
            break;
        };
        let count = remaining.len();
        indices.extend([
            remaining[(i + count - 1) % count] as u32,
            remaining[i] as u32,
            remaining[(i + 1) % count] as u32,
        ]);
        remaining.remove(i);
    }

    if remaining.len() == 3 {
        indices.extend(remaining.iter().map(|&i| i as u32));
    }
    indices
}

/// Triangulated mesh over `points`, facing +Z.
pub fn create_polygon_mesh(points: &[Vec2], z: f32) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    if points.len() < 3 {
        return mesh;
    }

    let vertices: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, z]).collect();
    let normals: Vec<[f32; 3]> = (0..points.len()).map(|_| [0.0, 0.0, 1.0]).collect();

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(triangulate_polygon(points)));
    mesh
}

pub fn create_point_mesh(points: &[Vec3]) -> Mesh {
    let positions: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
    let normals: Vec<[f32; 3]> = (0..points.len()).map(|_| [0.0, 0.0, 1.0]).collect();

    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

/// Despawn every entity carrying marker `M`.
pub fn clear_preview<M: Component>(commands: &mut Commands, existing: &Query<Entity, With<M>>) {
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
}
