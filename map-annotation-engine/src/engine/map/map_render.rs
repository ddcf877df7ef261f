use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::tools::zone::layer::ZoneLayer;
use bevy::image::{ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use constants::coordinate_system::{MAP_PLANE_Z, ZONE_OVERLAY_Z};

#[derive(Component)]
pub struct MapSurface;

#[derive(Component)]
pub struct ZoneOverlaySurface;

/// GPU images mirroring the occupancy grid and the zone overlay.
#[derive(Resource)]
pub struct MapTextures {
    pub map: Handle<Image>,
    pub zones: Handle<Image>,
}

/// Texture with the grid's pixels in image row order and nearest sampling,
/// so each map pixel stays a crisp square when zoomed in.
pub fn create_grid_image(grid: &OccupancyGrid) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: grid.width(),
            height: grid.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        grid.to_image().into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        mag_filter: ImageFilterMode::Nearest,
        min_filter: ImageFilterMode::Nearest,
        ..default()
    });
    image
}

fn surface_material(texture: Handle<Image>, alpha_mode: AlphaMode) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(texture),
        unlit: true,
        alpha_mode,
        ..default()
    }
}

// Spawn the map quad and the zone overlay quad once the session exists
pub fn spawn_map_surfaces(
    mut commands: Commands,
    grid: Res<OccupancyGrid>,
    zones: Res<ZoneLayer>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let info = grid.info();
    let size = info.world_size();
    let center = info.world_center();
    let quad = meshes.add(Rectangle::new(size.x, size.y));

    let map = images.add(create_grid_image(&grid));
    let overlay = images.add(create_grid_image(zones.overlay()));

    commands.spawn((
        MapSurface,
        Name::new("MapSurface"),
        Mesh3d(quad.clone()),
        MeshMaterial3d(materials.add(surface_material(map.clone(), AlphaMode::Opaque))),
        Transform::from_translation(center.extend(MAP_PLANE_Z)),
    ));
    commands.spawn((
        ZoneOverlaySurface,
        Name::new("ZoneOverlay"),
        Mesh3d(quad),
        MeshMaterial3d(materials.add(surface_material(overlay.clone(), AlphaMode::Blend))),
        Transform::from_translation(center.extend(ZONE_OVERLAY_Z)),
    ));

    commands.insert_resource(MapTextures {
        map,
        zones: overlay,
    });
}

fn upload(images: &mut Assets<Image>, handle: &Handle<Image>, grid: &OccupancyGrid) {
    match images.get_mut(handle) {
        Some(image) => image.data = Some(grid.to_image().into_raw()),
        None => warn!("Map texture missing, upload skipped"),
    }
}

/// Copy dirty grids to their textures, at most once per frame each.
pub fn sync_map_textures(
    grid: Option<ResMut<OccupancyGrid>>,
    zones: Option<ResMut<ZoneLayer>>,
    textures: Option<Res<MapTextures>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(textures) = textures else {
        return;
    };

    if let Some(mut grid) = grid {
        if grid.is_dirty() {
            grid.take_dirty();
            upload(&mut images, &textures.map, &grid);
        }
    }

    if let Some(mut zones) = zones {
        if zones.overlay().is_dirty() {
            zones.overlay_mut().take_dirty();
            upload(&mut images, &textures.zones, zones.overlay());
        }
    }
}
