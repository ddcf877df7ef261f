use crate::engine::errors::MapError;
use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::rpc::web_rpc::WebRpcInterface;
use bevy::prelude::*;
use constants::path::EDITED_MAP_SUFFIX;
use std::path::Path;

/// Request to write the current grid to disk.
#[derive(Event, Debug, Clone, Copy)]
pub struct SaveMapEvent;

/// Where edited maps are written, as an asset path.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MapSaveTarget {
    pub asset_path: String,
}

/// `maps/demo/office.pgm` → `maps/demo/office_edited.png`.
pub fn edited_map_path(source: &str) -> String {
    let path = Path::new(source);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("map");
    let file_name = format!("{stem}{EDITED_MAP_SUFFIX}.png");

    match path.parent().and_then(|parent| parent.to_str()) {
        Some(parent) if !parent.is_empty() => format!("{parent}/{file_name}"),
        _ => file_name,
    }
}

/// Encode the grid as PNG and write it, creating parent directories.
pub fn write_map_png(grid: &OccupancyGrid, path: &Path) -> Result<usize, MapError> {
    let bytes = grid.encode_png()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    Ok(bytes.len())
}

pub fn save_map_on_request(
    mut events: EventReader<SaveMapEvent>,
    grid: Option<Res<OccupancyGrid>>,
    target: Option<Res<MapSaveTarget>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    let (Some(grid), Some(target)) = (grid, target) else {
        warn!("Save requested before the map finished loading");
        return;
    };

    if cfg!(target_arch = "wasm32") {
        warn!("Saving to disk is unavailable in the browser; the host persists edits");
        return;
    }

    let path = Path::new("assets").join(&target.asset_path);
    match write_map_png(&grid, &path) {
        Ok(bytes) => {
            info!("Saved map to {} ({} bytes)", path.display(), bytes);
            rpc_interface.send_notification(
                "map_saved",
                serde_json::json!({
                    "path": target.asset_path,
                    "bytes": bytes
                }),
            );
        }
        Err(e) => error!("Failed to save map to {}: {}", path.display(), e),
    }
}

/// Ctrl+S saves the map (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_save_shortcut(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut save_events: EventWriter<SaveMapEvent>,
) {
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    if ctrl && keyboard.just_pressed(KeyCode::KeyS) {
        save_events.write(SaveMapEvent);
    }
}

#[cfg(target_arch = "wasm32")]
pub fn handle_save_shortcut() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::map_raster::MapRaster;
    use crate::engine::map::occupancy_grid::MapInfo;
    use constants::occupancy::{FREE, OCCUPIED};

    #[test]
    fn edited_path_sits_next_to_the_source() {
        assert_eq!(edited_map_path("maps/demo/office.pgm"), "maps/demo/office_edited.png");
        assert_eq!(edited_map_path("office.png"), "office_edited.png");
    }

    #[test]
    fn written_png_decodes_to_the_same_pixels() {
        let mut grid = OccupancyGrid::filled(MapInfo::new(4, 3, 0.05, Vec2::ZERO).unwrap(), FREE);
        grid.put_pixel(IVec2::new(1, 2), OCCUPIED);

        let path = std::env::temp_dir()
            .join(format!("map-annotation-{}", std::process::id()))
            .join("saved.png");
        let written = write_map_png(&grid, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), written);
        let raster = MapRaster::decode(&bytes).unwrap();
        // Buffer row 2 is the top image row.
        assert_eq!(raster.image.get_pixel(1, 0).0, OCCUPIED);
        assert_eq!(raster.image.get_pixel(0, 0).0, FREE);

        let _ = std::fs::remove_file(&path);
    }
}
