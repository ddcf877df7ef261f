use crate::engine::core::session::EditSession;
use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::engine::map::raster_editor::{apply_circular_brush, fill_polygon, BrushPredicate};
use crate::engine::map::snapshot::EditSnapshot;
use crate::tools::map_tool::{BrushState, MapTool};
use crate::tools::nodes::{NodeChange, NodeEditState, NodeEditor};
use crate::tools::preview::{clear_preview, PreviewBuilder};
use crate::tools::records::{to_point_array, FloorRecord, ToolCommit};
use crate::tools::settings::FloorSettings;
use bevy::prelude::*;
use constants::coordinate_system::PREVIEW_Z;
use constants::occupancy::FREE;
use constants::render_settings::{
    BRUSH_PREVIEW_COLOUR, CURSOR_MARKER_SIZE, FLOOR_PREVIEW_COLOUR, NODE_COLOUR,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorMode {
    #[default]
    Eraser,
    Polygon,
}

impl FloorMode {
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Eraser => "eraser",
            Self::Polygon => "polygon",
        }
    }
}

/// Clears map pixels to free space, either with a round brush or by filling
/// a node-drawn polygon.
#[derive(Resource)]
pub struct FloorTool {
    enabled: bool,
    session: Arc<EditSession>,
    settings: FloorSettings,
    mode: FloorMode,
    editor: NodeEditor,
    brush: BrushState,
    stroke: Vec<Vec2>,
    cursor: Option<Vec2>,
    snapshot: Option<EditSnapshot>,
    visuals_dirty: bool,
}

impl FloorTool {
    pub fn new(session: Arc<EditSession>, settings: FloorSettings) -> Self {
        Self {
            enabled: false,
            session,
            settings,
            mode: FloorMode::Eraser,
            editor: NodeEditor::new(settings.node_radius),
            brush: BrushState::Idle,
            stroke: Vec::new(),
            cursor: None,
            snapshot: None,
            visuals_dirty: false,
        }
    }

    pub fn set_mode(&mut self, mode: FloorMode) {
        self.mode = mode;
        self.visuals_dirty = true;
    }

    pub fn mode(&self) -> FloorMode {
        self.mode
    }

    pub fn settings(&self) -> &FloorSettings {
        &self.settings
    }

    pub fn editor(&self) -> &NodeEditor {
        &self.editor
    }

    pub fn brush(&self) -> BrushState {
        self.brush
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn take_visuals_dirty(&mut self) -> bool {
        std::mem::take(&mut self.visuals_dirty)
    }

    fn erase_at(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        let changed = apply_circular_brush(
            grid,
            world,
            self.settings.brush_radius,
            BrushPredicate::Always,
            FREE,
        );
        if changed > 0 {
            self.stroke.push(world);
        }
    }

    fn clear_edit(&mut self) {
        self.editor.clear();
        self.stroke.clear();
        self.brush = BrushState::Idle;
        self.visuals_dirty = true;
    }

    fn apply_polygon(&mut self, grid: &mut OccupancyGrid) -> Option<ToolCommit> {
        let polygon = self.editor.positions();
        if polygon.len() < 3 {
            warn!(
                "Floor polygon needs at least 3 points, got {}; apply skipped",
                polygon.len()
            );
            return None;
        }

        let pixels_changed = fill_polygon(grid, &polygon, FREE);
        info!("Cleared floor polygon ({} pixels)", pixels_changed);

        Some(ToolCommit::Floor(FloorRecord {
            map_id: self.session.map_id.clone(),
            mode: FloorMode::Polygon.to_string(),
            polygon: to_point_array(&polygon),
            pixels_changed,
        }))
    }

    fn apply_eraser(&self, grid: &OccupancyGrid) -> Option<ToolCommit> {
        let pixels_changed = self
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.changed_pixels(grid.as_raw()))
            .unwrap_or_default();
        if pixels_changed == 0 {
            return None;
        }

        info!("Committed floor erase ({} pixels)", pixels_changed);
        Some(ToolCommit::Floor(FloorRecord {
            map_id: self.session.map_id.clone(),
            mode: FloorMode::Eraser.to_string(),
            polygon: to_point_array(&self.stroke),
            pixels_changed,
        }))
    }
}

impl MapTool for FloorTool {
    type Target = OccupancyGrid;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self, grid: &mut OccupancyGrid) {
        self.snapshot = Some(grid.snapshot());
        self.clear_edit();
        self.cursor = None;
        self.enabled = true;
        info!("Floor tool enabled ({})", self.mode.to_string());
    }

    fn disable(&mut self, grid: &mut OccupancyGrid) {
        self.cancel(grid);
        self.snapshot = None;
        self.enabled = false;
    }

    fn pointer_down(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        match self.mode {
            FloorMode::Eraser => {
                self.brush = BrushState::Erasing;
                self.erase_at(grid, world);
            }
            FloorMode::Polygon => {
                if self.editor.pointer_down(world) != NodeChange::None {
                    self.visuals_dirty = true;
                }
            }
        }
    }

    fn pointer_move(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        self.cursor = Some(world);
        match self.mode {
            FloorMode::Eraser => {
                if self.brush == BrushState::Erasing {
                    self.erase_at(grid, world);
                }
                self.visuals_dirty = true;
            }
            FloorMode::Polygon => match self.editor.pointer_move(world) {
                NodeChange::Moved(_) => self.visuals_dirty = true,
                NodeChange::Hover if !self.editor.is_empty() => self.visuals_dirty = true,
                _ => {}
            },
        }
    }

    fn pointer_up(&mut self, _grid: &mut OccupancyGrid) {
        match self.mode {
            FloorMode::Eraser => self.brush = BrushState::Idle,
            FloorMode::Polygon => {
                if self.editor.pointer_up() != NodeChange::None {
                    self.visuals_dirty = true;
                }
            }
        }
    }

    fn apply(&mut self, grid: &mut OccupancyGrid) -> Option<ToolCommit> {
        let commit = match self.mode {
            FloorMode::Eraser => self.apply_eraser(grid),
            FloorMode::Polygon => self.apply_polygon(grid),
        };

        if commit.is_some() {
            self.snapshot = Some(grid.snapshot());
            self.clear_edit();
        }
        commit
    }

    fn cancel(&mut self, grid: &mut OccupancyGrid) {
        if let Some(snapshot) = &self.snapshot {
            grid.restore(snapshot);
        }
        self.clear_edit();
    }

    fn delete_selection(&mut self, _grid: &mut OccupancyGrid) -> Option<ToolCommit> {
        if self.mode == FloorMode::Polygon && self.editor.delete_selected().is_some() {
            self.visuals_dirty = true;
        }
        None
    }
}

#[derive(Component, Clone)]
pub struct FloorPreview;

pub fn update_floor_preview(
    mut commands: Commands,
    mut tool: ResMut<FloorTool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<FloorPreview>>,
) {
    if !tool.take_visuals_dirty() {
        return;
    }

    clear_preview(&mut commands, &existing);
    if !tool.is_enabled() {
        return;
    }

    let mut preview = PreviewBuilder {
        commands: &mut commands,
        meshes: &mut *meshes,
        materials: &mut *materials,
        marker: FloorPreview,
    };

    match tool.mode() {
        FloorMode::Eraser => {
            if let Some(cursor) = tool.cursor() {
                preview.disc(cursor, tool.settings().brush_radius, BRUSH_PREVIEW_COLOUR);
            }
        }
        FloorMode::Polygon => {
            let points = tool.editor().positions();
            if points.len() >= 3 {
                preview.polygon(&points, PREVIEW_Z, FLOOR_PREVIEW_COLOUR);
            }
            preview.outline(&points, NODE_COLOUR);
            preview.node_markers(tool.editor().nodes(), tool.editor().selected());

            if let (NodeEditState::Idle, Some(last), Some(hover)) = (
                tool.editor().state(),
                tool.editor().nodes().last(),
                tool.editor().hover(),
            ) {
                preview.edge(last.position, hover, NODE_COLOUR);
                preview.sphere(hover.extend(PREVIEW_Z), CURSOR_MARKER_SIZE, NODE_COLOUR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::occupancy_grid::MapInfo;
    use constants::occupancy::{OCCUPIED, UNKNOWN};

    fn unknown_grid() -> OccupancyGrid {
        OccupancyGrid::filled(MapInfo::new(40, 40, 0.05, Vec2::ZERO).unwrap(), UNKNOWN)
    }

    fn tool(grid: &mut OccupancyGrid, mode: FloorMode) -> FloorTool {
        let session = Arc::new(EditSession::starting_at("map-1", "site-1", 0.0));
        let mut tool = FloorTool::new(session, FloorSettings::default());
        tool.set_mode(mode);
        tool.enable(grid);
        tool
    }

    #[test]
    fn eraser_clears_any_pixel_while_held() {
        let mut g = unknown_grid();
        g.put_pixel(IVec2::new(20, 20), OCCUPIED);
        let mut tool = tool(&mut g, FloorMode::Eraser);

        tool.pointer_move(&mut g, Vec2::new(1.025, 1.025));
        assert_eq!(g.count_colour(FREE), 0);

        tool.pointer_down(&mut g, Vec2::new(1.025, 1.025));
        tool.pointer_move(&mut g, Vec2::new(1.225, 1.025));
        tool.pointer_up(&mut g);
        tool.pointer_move(&mut g, Vec2::new(0.2, 0.2));

        assert_eq!(g.pixel(IVec2::new(20, 20)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(24, 20)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(4, 4)), Some(UNKNOWN));
        assert_eq!(tool.brush(), BrushState::Idle);
    }

    #[test]
    fn polygon_apply_fills_with_free_space() {
        let mut g = unknown_grid();
        let mut tool = tool(&mut g, FloorMode::Polygon);
        for p in [Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5), Vec2::new(1.5, 1.5), Vec2::new(0.5, 1.5)] {
            tool.pointer_down(&mut g, p);
            tool.pointer_up(&mut g);
        }

        let Some(ToolCommit::Floor(record)) = tool.apply(&mut g) else {
            panic!("expected a floor commit");
        };
        assert_eq!(record.mode, "polygon");
        assert_eq!(record.pixels_changed, 20 * 20);
        assert_eq!(g.pixel(IVec2::new(10, 10)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(30, 10)), Some(UNKNOWN));
        assert!(tool.editor().is_empty());
    }

    #[test]
    fn polygon_apply_with_two_points_is_skipped() {
        let mut g = unknown_grid();
        let before = g.as_raw().to_vec();
        let mut tool = tool(&mut g, FloorMode::Polygon);
        tool.pointer_down(&mut g, Vec2::new(0.5, 0.5));
        tool.pointer_up(&mut g);
        tool.pointer_down(&mut g, Vec2::new(1.5, 0.5));
        tool.pointer_up(&mut g);

        assert!(tool.apply(&mut g).is_none());
        assert_eq!(g.as_raw(), before.as_slice());
        assert_eq!(tool.editor().len(), 2);
    }

    #[test]
    fn polygon_hover_refreshes_the_rubber_band() {
        let mut g = unknown_grid();
        let mut t = tool(&mut g, FloorMode::Polygon);
        t.take_visuals_dirty();

        // Nothing to stretch from before the first node.
        t.pointer_move(&mut g, Vec2::new(0.3, 0.3));
        assert!(!t.take_visuals_dirty());

        t.pointer_down(&mut g, Vec2::new(0.5, 0.5));
        t.pointer_up(&mut g);
        t.take_visuals_dirty();

        t.pointer_move(&mut g, Vec2::new(1.0, 0.8));
        assert!(t.take_visuals_dirty());
        assert_eq!(t.editor().state(), NodeEditState::Idle);
        assert_eq!(t.editor().hover(), Some(Vec2::new(1.0, 0.8)));
    }

    #[test]
    fn disable_discards_uncommitted_strokes() {
        let mut g = unknown_grid();
        let before = g.as_raw().to_vec();
        let mut tool = tool(&mut g, FloorMode::Eraser);
        tool.pointer_down(&mut g, Vec2::new(1.0, 1.0));
        tool.pointer_up(&mut g);

        tool.disable(&mut g);
        assert!(!tool.is_enabled());
        assert_eq!(g.as_raw(), before.as_slice());
    }
}
