use crate::engine::assets::editor_manifest::EditorManifest;
use crate::engine::assets::map_raster::MapRaster;
use crate::engine::assets::robot_model::RobotModel;
use crate::engine::camera::viewport_camera::{ViewportCamera, spawn_map_camera};
use crate::engine::core::session::{EditSession, SessionContext};
use crate::engine::errors::MapError;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::map::coordinate_mapper::CoordinateMapper;
use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::engine::map::persistence::{MapSaveTarget, edited_map_path};
use crate::tools::floor::FloorTool;
use crate::tools::pose::tool::PoseEstimateTool;
use crate::tools::settings::ToolSettingsSet;
use crate::tools::wall::WallTool;
use crate::tools::zone::layer::ZoneLayer;
use crate::tools::zone::tool::ZoneTool;
use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::path::{MANIFEST_FILE_NAME, RELATIVE_MANIFEST_PATH};
use std::sync::Arc;

#[derive(Resource, Default)]
pub struct ManifestLoader {
    manifest: Option<Handle<EditorManifest>>,
    raster: Option<Handle<MapRaster>>,
}

/// Everything an editing session needs, built from the manifest and raster.
pub struct SessionResources {
    pub session: Arc<EditSession>,
    pub grid: OccupancyGrid,
    pub zones: ZoneLayer,
    pub robot: RobotModel,
    pub settings: ToolSettingsSet,
    pub save_target: MapSaveTarget,
}

impl SessionResources {
    pub fn build(manifest: &EditorManifest, raster: &MapRaster) -> Result<Self, MapError> {
        let grid =
            OccupancyGrid::from_map_image(&raster.image, manifest.map.resolution, manifest.origin())?;
        let zones = ZoneLayer::with_zones(*grid.info(), manifest.zones.clone());

        Ok(Self {
            session: Arc::new(EditSession::new(
                manifest.session.map_id.clone(),
                manifest.session.site_id.clone(),
            )),
            zones,
            robot: RobotModel::from_config(&manifest.robot),
            settings: ToolSettingsSet::from_entries(&manifest.tools),
            save_target: MapSaveTarget {
                asset_path: edited_map_path(&manifest.map_asset_path()),
            },
            grid,
        })
    }

    /// Insert the grids, tools and camera as resources.
    pub fn insert(self, commands: &mut Commands) {
        let info = *self.grid.info();
        let session = self.session;

        commands.insert_resource(WallTool::new(
            session.clone(),
            self.settings.wall,
            info.resolution,
        ));
        commands.insert_resource(FloorTool::new(session.clone(), self.settings.floor));
        commands.insert_resource(ZoneTool::new(session.clone(), self.settings.zone));
        commands.insert_resource(PoseEstimateTool::new(session.clone(), self.settings.pose));
        commands.insert_resource(SessionContext(session));

        commands.insert_resource(CoordinateMapper::new(info));
        commands.insert_resource(self.grid);
        commands.insert_resource(self.zones);
        commands.insert_resource(self.robot);
        commands.insert_resource(self.settings);
        commands.insert_resource(self.save_target);

        let viewport = ViewportCamera::with_map(&info);
        spawn_map_camera(commands, &viewport);
        commands.insert_resource(viewport);
    }
}

// Start the loading process
pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    let manifest_path = format!("{}/{}", RELATIVE_MANIFEST_PATH, MANIFEST_FILE_NAME);
    info!("Loading editor manifest from {}", manifest_path);
    manifest_loader.manifest = Some(asset_server.load(manifest_path));
}

fn load_failed<A: Asset>(asset_server: &AssetServer, handle: &Handle<A>, what: &str) -> bool {
    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
        error!("Failed to load {}: {}", what, err);
        return true;
    }
    false
}

// Request the map raster once the manifest names it
pub fn load_manifest_system(
    mut loading_progress: ResMut<LoadingProgress>,
    mut manifest_loader: ResMut<ManifestLoader>,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<EditorManifest>>,
) {
    if loading_progress.manifest_loaded || loading_progress.failed {
        return;
    }
    let Some(handle) = manifest_loader.manifest.clone() else {
        return;
    };
    if load_failed(&asset_server, &handle, "editor manifest") {
        loading_progress.failed = true;
        return;
    }

    let Some(manifest) = manifests.get(&handle) else {
        return;
    };
    let raster_path = manifest.map_asset_path();
    info!(
        "Manifest loaded for map {} at site {}, loading {}",
        manifest.session.map_id, manifest.session.site_id, raster_path
    );
    manifest_loader.raster = Some(asset_server.load(raster_path));
    loading_progress.manifest_loaded = true;
}

pub fn create_session_when_ready(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    manifest_loader: Res<ManifestLoader>,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<EditorManifest>>,
    rasters: Res<Assets<MapRaster>>,
) {
    if loading_progress.session_created
        || !loading_progress.manifest_loaded
        || loading_progress.failed
    {
        return;
    }
    let (Some(manifest_handle), Some(raster_handle)) =
        (&manifest_loader.manifest, &manifest_loader.raster)
    else {
        return;
    };
    if load_failed(&asset_server, raster_handle, "map raster") {
        loading_progress.failed = true;
        return;
    }

    let (Some(manifest), Some(raster)) = (manifests.get(manifest_handle), rasters.get(raster_handle))
    else {
        return;
    };
    loading_progress.raster_loaded = true;

    match SessionResources::build(manifest, raster) {
        Ok(resources) => {
            let info = *resources.grid.info();
            info!(
                "Map {} ready: {}x{} px at {} m/px, {} zones",
                resources.session.map_id,
                info.width,
                info.height,
                info.resolution,
                resources.zones.zones().len()
            );
            resources.insert(&mut commands);
            loading_progress.session_created = true;
        }
        Err(e) => {
            error!("Failed to build map {}: {}", manifest.map.image, e);
            loading_progress.failed = true;
        }
    }
}
