use crate::engine::core::session::EditSession;
use crate::tools::map_tool::MapTool;
use crate::tools::nodes::{NodeChange, NodeEditState, NodeEditor};
use crate::tools::preview::{clear_preview, PreviewBuilder};
use crate::tools::records::{
    to_point_array, ToolCommit, ZoneDeletion, ZoneKind, ZoneRecord, ZoneStyle,
};
use crate::tools::settings::ZoneSettings;
use crate::tools::zone::layer::{ZoneLayer, ZoneLayerSnapshot};
use bevy::prelude::*;
use constants::coordinate_system::PREVIEW_Z;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a press on the map is interpreted by the zone tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneInteraction {
    /// Presses add nodes to the outline being drawn.
    #[default]
    Create,
    /// Presses pick committed zones (or nodes of the zone being edited).
    Select,
}

impl ZoneInteraction {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "select" => Some(Self::Select),
            _ => None,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Select => "select",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Create => Self::Select,
            Self::Select => Self::Create,
        }
    }
}

#[derive(Resource)]
pub struct ZoneTool {
    enabled: bool,
    session: Arc<EditSession>,
    settings: ZoneSettings,
    interaction: ZoneInteraction,
    kind: ZoneKind,
    style: ZoneStyle,
    editor: NodeEditor,
    /// Id of the committed zone loaded for editing.
    editing: Option<u32>,
    snapshot: Option<ZoneLayerSnapshot>,
    visuals_dirty: bool,
}

impl ZoneTool {
    pub fn new(session: Arc<EditSession>, settings: ZoneSettings) -> Self {
        let kind = settings.default_kind;
        Self {
            enabled: false,
            session,
            settings,
            interaction: ZoneInteraction::Create,
            kind,
            style: Self::kind_style(kind, &settings),
            editor: NodeEditor::new(settings.node_radius),
            editing: None,
            snapshot: None,
            visuals_dirty: false,
        }
    }

    fn kind_style(kind: ZoneKind, settings: &ZoneSettings) -> ZoneStyle {
        ZoneStyle {
            line_width: settings.line_width,
            ..kind.default_style()
        }
    }

    pub fn interaction(&self) -> ZoneInteraction {
        self.interaction
    }

    pub fn set_interaction(&mut self, interaction: ZoneInteraction) {
        if self.interaction != interaction {
            debug!("Zone interaction: {}", interaction.to_string());
            self.interaction = interaction;
            self.visuals_dirty = true;
        }
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn style(&self) -> &ZoneStyle {
        &self.style
    }

    /// Pick the kind for the zone being drawn; resets the style to that kind's default.
    pub fn set_kind(&mut self, kind: ZoneKind) {
        self.kind = kind;
        self.style = Self::kind_style(kind, &self.settings);
        self.visuals_dirty = true;
    }

    pub fn set_style(&mut self, style: ZoneStyle) {
        self.style = style;
        self.visuals_dirty = true;
    }

    pub fn editing(&self) -> Option<u32> {
        self.editing
    }

    pub fn editor(&self) -> &NodeEditor {
        &self.editor
    }

    pub fn take_visuals_dirty(&mut self) -> bool {
        std::mem::take(&mut self.visuals_dirty)
    }

    fn load_zone(&mut self, record: &ZoneRecord) {
        self.editor.load(&record.polygon());
        self.editing = Some(record.id);
        self.kind = record.kind;
        self.style = record.style;
        info!("Editing zone {} ({})", record.id, record.name);
    }

    fn select_down(&mut self, layer: &ZoneLayer, world: Vec2) {
        if self.editing.is_some() && self.editor.select_at(world).is_some() {
            return;
        }

        let Some(record) = layer.zone_at(world).and_then(|id| layer.get(id)) else {
            debug!("No zone at {}", world);
            return;
        };
        if self.editing == Some(record.id) {
            return;
        }
        if let Some(previous) = self.editing {
            let committed = layer.get(previous).map(|zone| zone.polygon());
            if committed.as_deref() != Some(self.editor.positions().as_slice()) {
                info!(
                    "Switching to zone {} discards unapplied edits to zone {}",
                    record.id, previous
                );
            }
        }
        let record = record.clone();
        self.load_zone(&record);
    }

    fn clear_edit(&mut self) {
        self.editor.clear();
        self.editing = None;
        self.visuals_dirty = true;
    }

    fn commit_layer(&mut self, layer: &mut ZoneLayer) {
        layer.rebuild_overlay();
        self.snapshot = Some(layer.snapshot());
        self.clear_edit();
    }
}

impl MapTool for ZoneTool {
    type Target = ZoneLayer;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self, layer: &mut ZoneLayer) {
        self.snapshot = Some(layer.snapshot());
        self.clear_edit();
        self.enabled = true;
        info!("Zone tool enabled ({})", self.interaction.to_string());
    }

    fn disable(&mut self, layer: &mut ZoneLayer) {
        self.cancel(layer);
        self.snapshot = None;
        self.enabled = false;
    }

    fn pointer_down(&mut self, layer: &mut ZoneLayer, world: Vec2) {
        match self.interaction {
            ZoneInteraction::Create => {
                self.editor.pointer_down(world);
            }
            ZoneInteraction::Select => self.select_down(layer, world),
        }
        self.visuals_dirty = true;
    }

    fn pointer_move(&mut self, _layer: &mut ZoneLayer, world: Vec2) {
        match self.editor.pointer_move(world) {
            NodeChange::Moved(_) => self.visuals_dirty = true,
            NodeChange::Hover => {
                if self.interaction == ZoneInteraction::Create && !self.editor.is_empty() {
                    self.visuals_dirty = true;
                }
            }
            _ => {}
        }
    }

    fn pointer_up(&mut self, _layer: &mut ZoneLayer) {
        if self.editor.pointer_up() != NodeChange::None {
            self.visuals_dirty = true;
        }
    }

    fn apply(&mut self, layer: &mut ZoneLayer) -> Option<ToolCommit> {
        let polygon = self.editor.positions();
        if polygon.len() < 3 {
            warn!(
                "Zone needs at least 3 points, got {}; apply skipped",
                polygon.len()
            );
            return None;
        }

        let id = self.editing.unwrap_or_else(|| layer.allocate_id());
        let name = layer
            .get(id)
            .map(|existing| existing.name.clone())
            .unwrap_or_else(|| format!("{} zone {}", self.kind.to_string(), id));

        let record = ZoneRecord {
            id,
            name,
            kind: self.kind,
            points: to_point_array(&polygon),
            style: self.style,
            map_id: self.session.map_id.clone(),
            site_id: self.session.site_id.clone(),
        };
        layer.upsert(record.clone());
        self.commit_layer(layer);

        info!(
            "Committed zone {} ({}, {} points)",
            record.id,
            record.kind.to_string(),
            record.points.len()
        );
        Some(ToolCommit::Zone(record))
    }

    fn cancel(&mut self, layer: &mut ZoneLayer) {
        if let Some(snapshot) = &self.snapshot {
            layer.restore(snapshot);
        }
        self.clear_edit();
    }

    /// Delete the selected node of the outline, or the loaded zone when no
    /// node is selected.
    fn delete_selection(&mut self, layer: &mut ZoneLayer) -> Option<ToolCommit> {
        if self.editor.delete_selected().is_some() {
            self.visuals_dirty = true;
            return None;
        }

        let id = self.editing?;
        let removed = layer.remove(id)?;
        self.commit_layer(layer);

        info!("Deleted zone {} ({})", removed.id, removed.name);
        Some(ToolCommit::ZoneDeleted(ZoneDeletion {
            id: removed.id,
            map_id: self.session.map_id.clone(),
            site_id: self.session.site_id.clone(),
        }))
    }
}

#[derive(Component, Clone)]
pub struct ZonePreview;

pub fn update_zone_preview(
    mut commands: Commands,
    mut tool: ResMut<ZoneTool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<ZonePreview>>,
) {
    if !tool.take_visuals_dirty() {
        return;
    }

    clear_preview(&mut commands, &existing);
    if !tool.is_enabled() {
        return;
    }

    let colour = tool.style().bevy_colour();
    let points = tool.editor().positions();
    let mut preview = PreviewBuilder {
        commands: &mut commands,
        meshes: &mut *meshes,
        materials: &mut *materials,
        marker: ZonePreview,
    };

    if points.len() >= 3 {
        preview.polygon(&points, PREVIEW_Z, colour);
    }
    let line_width = tool.style().line_width;
    preview.outline_with_width(&points, line_width, colour.with_alpha(1.0));
    preview.node_markers(tool.editor().nodes(), tool.editor().selected());

    if tool.interaction() == ZoneInteraction::Create {
        if let (NodeEditState::Idle, Some(last), Some(hover)) = (
            tool.editor().state(),
            tool.editor().nodes().last(),
            tool.editor().hover(),
        ) {
            preview.edge_with_width(
                last.position.extend(PREVIEW_Z),
                hover.extend(PREVIEW_Z),
                line_width,
                colour.with_alpha(1.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::occupancy_grid::MapInfo;
    use constants::occupancy::TRANSPARENT;
    use pretty_assertions::assert_eq;

    fn setup() -> (ZoneTool, ZoneLayer) {
        let session = Arc::new(EditSession::starting_at("map-1", "site-1", 0.0));
        let mut layer = ZoneLayer::new(MapInfo::new(40, 40, 0.05, Vec2::ZERO).unwrap());
        let mut tool = ZoneTool::new(session, ZoneSettings::default());
        tool.enable(&mut layer);
        (tool, layer)
    }

    fn click(tool: &mut ZoneTool, layer: &mut ZoneLayer, world: Vec2) {
        tool.pointer_down(layer, world);
        tool.pointer_up(layer);
    }

    fn draw_square(tool: &mut ZoneTool, layer: &mut ZoneLayer, min: Vec2, size: f32) {
        for corner in [
            min,
            min + Vec2::new(size, 0.0),
            min + Vec2::splat(size),
            min + Vec2::new(0.0, size),
        ] {
            click(tool, layer, corner);
        }
    }

    #[test]
    fn apply_records_the_zone_with_session_ids() {
        let (mut tool, mut layer) = setup();
        tool.set_kind(ZoneKind::Forbidden);
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);

        let Some(ToolCommit::Zone(record)) = tool.apply(&mut layer) else {
            panic!("expected a zone commit");
        };
        assert_eq!(record.id, 1);
        assert_eq!(record.kind, ZoneKind::Forbidden);
        assert_eq!(record.site_id, "site-1");
        assert_eq!(layer.zones().len(), 1);
        assert_eq!(
            layer.overlay().pixel(IVec2::new(15, 15)),
            Some(ZoneKind::Forbidden.default_style().colour)
        );
        assert!(tool.editor().is_empty());
    }

    #[test]
    fn select_mode_loads_edits_and_replaces_a_zone() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);
        tool.apply(&mut layer);

        tool.set_interaction(ZoneInteraction::Select);
        click(&mut tool, &mut layer, Vec2::new(0.2, 0.2));
        assert_eq!(tool.editing(), None);

        click(&mut tool, &mut layer, Vec2::new(0.75, 0.75));
        assert_eq!(tool.editing(), Some(1));
        assert_eq!(tool.editor().len(), 4);

        // Drag the top-right corner outwards.
        tool.pointer_down(&mut layer, Vec2::new(1.0, 1.0));
        tool.pointer_move(&mut layer, Vec2::new(1.5, 1.5));
        tool.pointer_up(&mut layer);

        let Some(ToolCommit::Zone(record)) = tool.apply(&mut layer) else {
            panic!("expected a zone commit");
        };
        assert_eq!(record.id, 1);
        assert_eq!(record.points[2], [1.5, 1.5]);
        assert_eq!(layer.zones().len(), 1);
        assert_eq!(layer.zone_at(Vec2::new(1.2, 1.1)), Some(1));
    }

    #[test]
    fn delete_removes_the_loaded_zone() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);
        tool.apply(&mut layer);

        tool.set_interaction(ZoneInteraction::Select);
        click(&mut tool, &mut layer, Vec2::new(0.75, 0.75));

        let Some(ToolCommit::ZoneDeleted(deleted)) = tool.delete_selection(&mut layer) else {
            panic!("expected a deletion");
        };
        assert_eq!(deleted.id, 1);
        assert!(layer.zones().is_empty());
        assert_eq!(layer.overlay().count_colour(TRANSPARENT), 40 * 40);

        // The deletion is committed; cancel does not bring it back.
        tool.cancel(&mut layer);
        assert!(layer.zones().is_empty());
    }

    #[test]
    fn pressing_inside_the_loaded_zone_keeps_dragged_nodes() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);
        tool.apply(&mut layer);

        tool.set_interaction(ZoneInteraction::Select);
        click(&mut tool, &mut layer, Vec2::new(0.75, 0.75));
        tool.pointer_down(&mut layer, Vec2::new(1.0, 1.0));
        tool.pointer_move(&mut layer, Vec2::new(1.2, 1.2));
        tool.pointer_up(&mut layer);
        let dragged = tool.editor().positions();

        click(&mut tool, &mut layer, Vec2::new(0.7, 0.7));

        assert_eq!(tool.editing(), Some(1));
        assert_eq!(tool.editor().positions(), dragged);
    }

    #[test]
    fn pressing_inside_another_zone_switches_to_it() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.1, 0.1), 0.5);
        tool.apply(&mut layer);
        draw_square(&mut tool, &mut layer, Vec2::new(1.2, 1.2), 0.5);
        tool.apply(&mut layer);

        tool.set_interaction(ZoneInteraction::Select);
        click(&mut tool, &mut layer, Vec2::new(0.3, 0.3));
        assert_eq!(tool.editing(), Some(1));

        click(&mut tool, &mut layer, Vec2::new(1.4, 1.4));
        assert_eq!(tool.editing(), Some(2));
        assert_eq!(tool.editor().positions(), layer.get(2).unwrap().polygon());
    }

    #[test]
    fn delete_prefers_the_selected_node() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);

        assert!(tool.delete_selection(&mut layer).is_none());
        assert_eq!(tool.editor().len(), 3);
    }

    #[test]
    fn cancel_discards_an_uncommitted_edit() {
        let (mut tool, mut layer) = setup();
        draw_square(&mut tool, &mut layer, Vec2::new(0.5, 0.5), 0.5);
        tool.apply(&mut layer);
        let records = layer.zones().to_vec();
        let pixels = layer.overlay().as_raw().to_vec();

        tool.set_interaction(ZoneInteraction::Select);
        click(&mut tool, &mut layer, Vec2::new(0.75, 0.75));
        tool.pointer_down(&mut layer, Vec2::new(1.0, 1.0));
        tool.pointer_move(&mut layer, Vec2::new(1.8, 1.8));
        tool.pointer_up(&mut layer);

        tool.cancel(&mut layer);
        assert_eq!(layer.zones(), records.as_slice());
        assert_eq!(layer.overlay().as_raw(), pixels.as_slice());
        assert_eq!(tool.editing(), None);
        assert!(tool.editor().is_empty());
    }

    #[test]
    fn degenerate_outline_is_not_committed() {
        let (mut tool, mut layer) = setup();
        click(&mut tool, &mut layer, Vec2::new(0.5, 0.5));
        click(&mut tool, &mut layer, Vec2::new(1.0, 0.5));
        assert!(tool.apply(&mut layer).is_none());
        assert!(layer.zones().is_empty());
    }
}
