use crate::engine::core::session::EditSession;
use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::engine::map::raster_editor::{apply_circular_brush, rasterize_line, BrushPredicate};
use crate::engine::map::snapshot::EditSnapshot;
use crate::tools::map_tool::{BrushState, MapTool};
use crate::tools::nodes::{NodeChange, NodeEditState, NodeEditor};
use crate::tools::preview::{clear_preview, PreviewBuilder};
use crate::tools::records::{to_point_array, ToolCommit, WallRecord};
use crate::tools::settings::WallSettings;
use bevy::prelude::*;
use constants::coordinate_system::PREVIEW_Z;
use constants::occupancy::{FREE, OCCUPIED};
use constants::render_settings::{BRUSH_PREVIEW_COLOUR, WALL_PREVIEW_COLOUR};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallMode {
    #[default]
    Draw,
    Erase,
}

impl WallMode {
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Erase => "erase",
        }
    }
}

/// Straight wall between two consecutive nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    pub start: usize,
    pub end: usize,
    /// Preview rectangle, `None` while both nodes coincide.
    pub quad: Option<[Vec2; 4]>,
}

/// Corners of a `width` metre wide rectangle centred on `start -> end`.
pub fn segment_quad(start: Vec2, end: Vec2, width: f32) -> Option<[Vec2; 4]> {
    let direction = (end - start).try_normalize()?;
    let offset = direction.perp() * (width * 0.5);
    Some([start + offset, end + offset, end - offset, start - offset])
}

/// Polyline wall editor plus the occupied-only wall eraser.
#[derive(Resource)]
pub struct WallTool {
    enabled: bool,
    session: Arc<EditSession>,
    settings: WallSettings,
    resolution: f32,
    mode: WallMode,
    editor: NodeEditor,
    segments: Vec<WallSegment>,
    brush: BrushState,
    stroke: Vec<Vec2>,
    cursor: Option<Vec2>,
    snapshot: Option<EditSnapshot>,
    visuals_dirty: bool,
}

impl WallTool {
    pub fn new(session: Arc<EditSession>, settings: WallSettings, resolution: f32) -> Self {
        Self {
            enabled: false,
            session,
            settings,
            resolution,
            mode: WallMode::Draw,
            editor: NodeEditor::new(settings.node_radius),
            segments: Vec::new(),
            brush: BrushState::Idle,
            stroke: Vec::new(),
            cursor: None,
            snapshot: None,
            visuals_dirty: false,
        }
    }

    /// Switch between drawing and erasing. Pointer input uses the new mode
    /// immediately; placed nodes and erased pixels stay until apply or cancel.
    pub fn set_mode(&mut self, mode: WallMode) {
        self.mode = mode;
        self.visuals_dirty = true;
    }

    pub fn mode(&self) -> WallMode {
        self.mode
    }

    pub fn settings(&self) -> &WallSettings {
        &self.settings
    }

    pub fn editor(&self) -> &NodeEditor {
        &self.editor
    }

    pub fn segments(&self) -> &[WallSegment] {
        &self.segments
    }

    pub fn brush(&self) -> BrushState {
        self.brush
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Wall width in metres, as drawn by the preview quads.
    pub fn world_width(&self) -> f32 {
        self.settings.width_px as f32 * self.resolution
    }

    pub fn take_visuals_dirty(&mut self) -> bool {
        std::mem::take(&mut self.visuals_dirty)
    }

    fn segment(&self, start: usize) -> Option<WallSegment> {
        let a = self.editor.nodes().get(start)?.position;
        let b = self.editor.nodes().get(start + 1)?.position;
        Some(WallSegment {
            start,
            end: start + 1,
            quad: segment_quad(a, b, self.world_width()),
        })
    }

    fn regenerate_segment(&mut self, start: usize) {
        if let (Some(segment), Some(slot)) = (self.segment(start), self.segments.get_mut(start)) {
            *slot = segment;
        }
    }

    fn rebuild_segments(&mut self) {
        self.segments = (0..self.editor.len().saturating_sub(1))
            .filter_map(|start| self.segment(start))
            .collect();
    }

    fn on_node_change(&mut self, change: NodeChange) {
        match change {
            NodeChange::Added(index) if index > 0 => {
                if let Some(segment) = self.segment(index - 1) {
                    self.segments.push(segment);
                }
            }
            NodeChange::Moved(index) => {
                if index > 0 {
                    self.regenerate_segment(index - 1);
                }
                self.regenerate_segment(index);
            }
            NodeChange::Hover if self.editor.is_empty() => return,
            NodeChange::None => return,
            _ => {}
        }
        self.visuals_dirty = true;
    }

    fn erase_at(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        let changed = apply_circular_brush(
            grid,
            world,
            self.settings.eraser_radius,
            BrushPredicate::OnlyOccupied,
            FREE,
        );
        if changed > 0 {
            self.stroke.push(world);
            debug!("Wall eraser cleared {} pixels at {}", changed, world);
        }
    }

    fn clear_edit(&mut self) {
        self.editor.clear();
        self.segments.clear();
        self.stroke.clear();
        self.brush = BrushState::Idle;
        self.visuals_dirty = true;
    }

    fn apply_draw(&mut self, grid: &mut OccupancyGrid) -> Option<ToolCommit> {
        let polyline = self.editor.positions();
        if polyline.len() < 2 {
            debug!("Wall apply skipped, {} node(s) placed", polyline.len());
            return None;
        }

        let pixels_changed: usize = self
            .segments
            .iter()
            .map(|segment| {
                rasterize_line(
                    grid,
                    polyline[segment.start],
                    polyline[segment.end],
                    self.settings.width_px,
                    OCCUPIED,
                )
            })
            .sum();

        info!(
            "Committed wall with {} segments ({} pixels)",
            self.segments.len(),
            pixels_changed
        );

        Some(ToolCommit::Wall(WallRecord {
            map_id: self.session.map_id.clone(),
            mode: WallMode::Draw.to_string(),
            polyline: to_point_array(&polyline),
            width_px: self.settings.width_px,
            pixels_changed,
        }))
    }

    fn apply_erase(&mut self, grid: &OccupancyGrid) -> Option<ToolCommit> {
        let pixels_changed = self
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.changed_pixels(grid.as_raw()))
            .unwrap_or_default();
        if pixels_changed == 0 {
            debug!("Wall eraser apply skipped, nothing erased");
            return None;
        }

        info!("Committed wall erase ({} pixels)", pixels_changed);
        Some(ToolCommit::Wall(WallRecord {
            map_id: self.session.map_id.clone(),
            mode: WallMode::Erase.to_string(),
            polyline: to_point_array(&self.stroke),
            width_px: self.settings.width_px,
            pixels_changed,
        }))
    }
}

impl MapTool for WallTool {
    type Target = OccupancyGrid;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self, grid: &mut OccupancyGrid) {
        self.snapshot = Some(grid.snapshot());
        self.clear_edit();
        self.cursor = None;
        self.enabled = true;
        info!("Wall tool enabled ({})", self.mode.to_string());
    }

    fn disable(&mut self, grid: &mut OccupancyGrid) {
        self.cancel(grid);
        self.snapshot = None;
        self.enabled = false;
    }

    fn pointer_down(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        match self.mode {
            WallMode::Draw => {
                let change = self.editor.pointer_down(world);
                self.on_node_change(change);
            }
            WallMode::Erase => {
                self.brush = BrushState::Erasing;
                self.erase_at(grid, world);
            }
        }
    }

    fn pointer_move(&mut self, grid: &mut OccupancyGrid, world: Vec2) {
        self.cursor = Some(world);
        match self.mode {
            WallMode::Draw => {
                let change = self.editor.pointer_move(world);
                self.on_node_change(change);
            }
            WallMode::Erase => {
                if self.brush == BrushState::Erasing {
                    self.erase_at(grid, world);
                }
                self.visuals_dirty = true;
            }
        }
    }

    fn pointer_up(&mut self, _grid: &mut OccupancyGrid) {
        match self.mode {
            WallMode::Draw => {
                let change = self.editor.pointer_up();
                self.on_node_change(change);
            }
            WallMode::Erase => self.brush = BrushState::Idle,
        }
    }

    fn apply(&mut self, grid: &mut OccupancyGrid) -> Option<ToolCommit> {
        let commit = match self.mode {
            WallMode::Draw => self.apply_draw(grid),
            WallMode::Erase => self.apply_erase(grid),
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
        if self.mode == WallMode::Draw && self.editor.delete_selected().is_some() {
            self.rebuild_segments();
            self.visuals_dirty = true;
        }
        None
    }
}

#[derive(Component, Clone)]
pub struct WallPreview;

pub fn update_wall_preview(
    mut commands: Commands,
    mut tool: ResMut<WallTool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<WallPreview>>,
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
        marker: WallPreview,
    };

    match tool.mode() {
        WallMode::Draw => {
            for quad in tool.segments().iter().filter_map(|segment| segment.quad) {
                preview.polygon(&quad, PREVIEW_Z, WALL_PREVIEW_COLOUR);
            }
            preview.node_markers(tool.editor().nodes(), tool.editor().selected());

            // Rubber band from the last node to the cursor.
            if let (NodeEditState::Idle, Some(last), Some(hover)) = (
                tool.editor().state(),
                tool.editor().nodes().last(),
                tool.editor().hover(),
            ) {
                preview.edge(last.position, hover, WALL_PREVIEW_COLOUR);
            }
        }
        WallMode::Erase => {
            if let Some(cursor) = tool.cursor() {
                preview.disc(cursor, tool.settings().eraser_radius, BRUSH_PREVIEW_COLOUR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::occupancy_grid::MapInfo;

    fn grid() -> OccupancyGrid {
        OccupancyGrid::filled(MapInfo::new(100, 100, 0.05, Vec2::ZERO).unwrap(), FREE)
    }

    fn tool(grid: &mut OccupancyGrid) -> WallTool {
        let session = Arc::new(EditSession::starting_at("map-1", "site-1", 0.0));
        let mut tool = WallTool::new(session, WallSettings::default(), 0.05);
        tool.enable(grid);
        tool
    }

    fn click(tool: &mut WallTool, grid: &mut OccupancyGrid, world: Vec2) {
        tool.pointer_down(grid, world);
        tool.pointer_up(grid);
    }

    #[test]
    fn quad_is_offset_perpendicular_to_the_segment() {
        let quad = segment_quad(Vec2::ZERO, Vec2::new(2.0, 0.0), 0.2).unwrap();
        assert_eq!(
            quad,
            [
                Vec2::new(0.0, 0.1),
                Vec2::new(2.0, 0.1),
                Vec2::new(2.0, -0.1),
                Vec2::new(0.0, -0.1),
            ]
        );
        assert!(segment_quad(Vec2::ONE, Vec2::ONE, 0.2).is_none());
    }

    #[test]
    fn each_new_node_after_the_first_adds_a_segment() {
        let mut g = grid();
        let mut tool = tool(&mut g);

        click(&mut tool, &mut g, Vec2::new(0.5, 0.5));
        assert!(tool.segments().is_empty());
        click(&mut tool, &mut g, Vec2::new(1.5, 0.5));
        click(&mut tool, &mut g, Vec2::new(1.5, 1.5));

        assert_eq!(tool.segments().len(), 2);
        assert_eq!((tool.segments()[1].start, tool.segments()[1].end), (1, 2));
    }

    #[test]
    fn dragging_a_node_regenerates_both_adjacent_quads() {
        let mut g = grid();
        let mut tool = tool(&mut g);
        for p in [Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5), Vec2::new(2.5, 0.5)] {
            click(&mut tool, &mut g, p);
        }

        tool.pointer_down(&mut g, Vec2::new(1.5, 0.5));
        tool.pointer_move(&mut g, Vec2::new(1.5, 1.5));
        tool.pointer_up(&mut g);

        let width = tool.world_width();
        assert_eq!(
            tool.segments()[0].quad,
            segment_quad(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5), width)
        );
        assert_eq!(
            tool.segments()[1].quad,
            segment_quad(Vec2::new(1.5, 1.5), Vec2::new(2.5, 0.5), width)
        );
    }

    #[test]
    fn apply_needs_two_nodes() {
        let mut g = grid();
        let mut tool = tool(&mut g);
        click(&mut tool, &mut g, Vec2::new(0.5, 0.5));

        assert!(tool.apply(&mut g).is_none());
        assert_eq!(g.count_colour(OCCUPIED), 0);
        assert_eq!(tool.editor().len(), 1);
    }

    #[test]
    fn apply_commits_a_record_and_clears_nodes() {
        let mut g = grid();
        let mut tool = tool(&mut g);
        click(&mut tool, &mut g, Vec2::new(1.0, 1.0));
        click(&mut tool, &mut g, Vec2::new(2.0, 1.0));

        let Some(ToolCommit::Wall(record)) = tool.apply(&mut g) else {
            panic!("expected a wall commit");
        };
        assert_eq!(record.map_id, "map-1");
        assert_eq!(record.polyline, vec![[1.0, 1.0], [2.0, 1.0]]);
        assert_eq!(record.pixels_changed, g.count_colour(OCCUPIED));
        assert!(tool.editor().is_empty());

        // The commit becomes the new rollback point.
        tool.cancel(&mut g);
        assert_eq!(g.count_colour(OCCUPIED), record.pixels_changed);
    }

    #[test]
    fn cancel_restores_the_activation_snapshot() {
        let mut g = grid();
        g.put_pixel(IVec2::new(5, 5), OCCUPIED);
        let before = g.as_raw().to_vec();

        let mut tool = tool(&mut g);
        tool.set_mode(WallMode::Erase);
        tool.pointer_down(&mut g, Vec2::new(0.27, 0.27));
        tool.pointer_up(&mut g);
        assert_ne!(g.as_raw(), before.as_slice());

        tool.cancel(&mut g);
        tool.cancel(&mut g);
        assert_eq!(g.as_raw(), before.as_slice());
    }

    #[test]
    fn eraser_only_clears_occupied_pixels_while_held() {
        let mut g = grid();
        g.put_pixel(IVec2::new(10, 10), OCCUPIED);
        g.put_pixel(IVec2::new(30, 10), OCCUPIED);
        g.put_pixel(IVec2::new(11, 10), [205, 205, 205, 255]);

        let mut tool = tool(&mut g);
        tool.set_mode(WallMode::Erase);

        // Hovering does not erase.
        tool.pointer_move(&mut g, Vec2::new(1.525, 0.525));
        assert_eq!(g.pixel(IVec2::new(30, 10)), Some(OCCUPIED));

        tool.pointer_down(&mut g, Vec2::new(0.525, 0.525));
        assert_eq!(tool.brush(), BrushState::Erasing);
        tool.pointer_up(&mut g);

        assert_eq!(g.pixel(IVec2::new(10, 10)), Some(FREE));
        assert_eq!(g.pixel(IVec2::new(11, 10)), Some([205, 205, 205, 255]));

        let Some(ToolCommit::Wall(record)) = tool.apply(&mut g) else {
            panic!("expected an erase commit");
        };
        assert_eq!(record.mode, "erase");
        assert_eq!(record.pixels_changed, 1);
        assert!(tool.apply(&mut g).is_none());
    }

    #[test]
    fn deleting_a_middle_node_rejoins_the_polyline() {
        let mut g = grid();
        let mut tool = tool(&mut g);
        for p in [Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5), Vec2::new(2.5, 0.5)] {
            click(&mut tool, &mut g, p);
        }
        click(&mut tool, &mut g, Vec2::new(1.5, 0.5));

        tool.delete_selection(&mut g);

        assert_eq!(tool.editor().len(), 2);
        assert_eq!(tool.segments().len(), 1);
        assert_eq!(
            tool.segments()[0].quad,
            segment_quad(Vec2::new(0.5, 0.5), Vec2::new(2.5, 0.5), tool.world_width())
        );
    }
}
