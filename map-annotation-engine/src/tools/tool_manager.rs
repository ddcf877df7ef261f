use crate::engine::assets::robot_model::RobotModel;
use crate::engine::map::occupancy_grid::OccupancyGrid;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::floor::{FloorMode, FloorTool};
use crate::tools::map_tool::MapTool;
use crate::tools::pointer::MapPointerEvent;
use crate::tools::pose::tool::PoseEstimateTool;
use crate::tools::records::{ToolCommit, ZoneKind, ZoneStyle};
use crate::tools::wall::{WallMode, WallTool};
use crate::tools::zone::layer::ZoneLayer;
use crate::tools::zone::tool::{ZoneInteraction, ZoneTool};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Enumeration of available tools. Wall and floor carry their sub-mode so the
/// eraser variants can be selected directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolType {
    Wall(WallMode),
    Floor(FloorMode),
    Zone,
    PoseEstimate,
}

impl ToolType {
    /// Convert string identifier to tool type for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "wall" => Some(Self::Wall(WallMode::Draw)),
            "wall_eraser" => Some(Self::Wall(WallMode::Erase)),
            "floor_eraser" => Some(Self::Floor(FloorMode::Eraser)),
            "floor_polygon" => Some(Self::Floor(FloorMode::Polygon)),
            "zone" => Some(Self::Zone),
            "pose_estimate" => Some(Self::PoseEstimate),
            _ => None,
        }
    }

    /// Convert tool type to string identifier for frontend communication.
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Wall(WallMode::Draw) => "wall",
            Self::Wall(WallMode::Erase) => "wall_eraser",
            Self::Floor(FloorMode::Eraser) => "floor_eraser",
            Self::Floor(FloorMode::Polygon) => "floor_polygon",
            Self::Zone => "zone",
            Self::PoseEstimate => "pose_estimate",
        }
    }
}

/// Resource tracking the currently active tool.
#[derive(Resource, Default)]
pub struct ToolManager {
    active_tool: Option<ToolType>,
}

impl ToolManager {
    /// Record `tool_type` as active. Returns false when it already was.
    pub fn activate_tool(&mut self, tool_type: ToolType) -> bool {
        if self.active_tool == Some(tool_type) {
            return false;
        }

        self.active_tool = Some(tool_type);
        info!("Tool manager activated: {}", tool_type.to_string());
        true
    }

    pub fn deactivate_current_tool(&mut self) -> Option<ToolType> {
        let previous = self.active_tool.take();
        if let Some(tool) = previous {
            info!("Tool manager deactivated: {}", tool.to_string());
        }
        previous
    }

    pub fn active_tool(&self) -> Option<ToolType> {
        self.active_tool
    }

    pub fn is_tool_active(&self, tool_type: ToolType) -> bool {
        self.active_tool == Some(tool_type)
    }
}

/// Source of a tool request, for logging and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSelectionSource {
    Rpc,
    Keyboard,
}

impl ToolSelectionSource {
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Rpc => "rpc",
            Self::Keyboard => "keyboard",
        }
    }
}

/// Event fired when tool selection changes via RPC or keyboard shortcuts.
#[derive(Event, Debug, Clone, Copy)]
pub struct ToolSelectionEvent {
    pub tool_type: ToolType,
    pub source: ToolSelectionSource,
}

/// Deactivate the current tool, discarding any uncommitted edit.
#[derive(Event, Debug, Clone, Copy)]
pub struct ClearToolEvent {
    pub source: ToolSelectionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Apply,
    Cancel,
    DeleteSelection,
}

impl ToolAction {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "apply" => Some(Self::Apply),
            "cancel" => Some(Self::Cancel),
            "delete_selection" => Some(Self::DeleteSelection),
            _ => None,
        }
    }
}

/// Apply, cancel or delete on whichever tool is active.
#[derive(Event, Debug, Clone, Copy)]
pub struct ToolActionEvent {
    pub action: ToolAction,
    pub source: ToolSelectionSource,
}

/// Pick the zone kind, optionally overriding its default style.
#[derive(Event, Debug, Clone, Copy)]
pub struct ZoneStyleEvent {
    pub kind: ZoneKind,
    pub style: Option<ZoneStyle>,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ZoneInteractionEvent {
    pub interaction: ZoneInteraction,
}

/// Every tool together with the state it edits.
///
/// Tools and targets are inserted once the map has loaded; until then every
/// call is a no-op.
#[derive(SystemParam)]
pub struct MapTools<'w> {
    grid: Option<ResMut<'w, OccupancyGrid>>,
    zones: Option<ResMut<'w, ZoneLayer>>,
    robot: Option<ResMut<'w, RobotModel>>,
    wall: Option<ResMut<'w, WallTool>>,
    floor: Option<ResMut<'w, FloorTool>>,
    zone: Option<ResMut<'w, ZoneTool>>,
    pose: Option<ResMut<'w, PoseEstimateTool>>,
}

/// Run `$body` with the tool behind `$tool_type` and its target, yielding
/// `Option` of the body's value.
macro_rules! with_tool {
    ($tools:expr, $tool_type:expr, |$tool:ident, $target:ident| $body:expr) => {
        match $tool_type {
            ToolType::Wall(_) => match ($tools.wall.as_deref_mut(), $tools.grid.as_deref_mut()) {
                (Some($tool), Some($target)) => Some($body),
                _ => None,
            },
            ToolType::Floor(_) => match ($tools.floor.as_deref_mut(), $tools.grid.as_deref_mut()) {
                (Some($tool), Some($target)) => Some($body),
                _ => None,
            },
            ToolType::Zone => match ($tools.zone.as_deref_mut(), $tools.zones.as_deref_mut()) {
                (Some($tool), Some($target)) => Some($body),
                _ => None,
            },
            ToolType::PoseEstimate => {
                match ($tools.pose.as_deref_mut(), $tools.robot.as_deref_mut()) {
                    (Some($tool), Some($target)) => Some($body),
                    _ => None,
                }
            }
        }
    };
}

impl MapTools<'_> {
    pub fn is_ready(&self) -> bool {
        self.grid.is_some() && self.zones.is_some() && self.robot.is_some()
    }

    pub fn enable(&mut self, tool_type: ToolType) -> bool {
        match tool_type {
            ToolType::Wall(mode) => {
                if let Some(wall) = self.wall.as_deref_mut() {
                    wall.set_mode(mode);
                }
            }
            ToolType::Floor(mode) => {
                if let Some(floor) = self.floor.as_deref_mut() {
                    floor.set_mode(mode);
                }
            }
            ToolType::Zone | ToolType::PoseEstimate => {}
        }
        with_tool!(self, tool_type, |tool, target| tool.enable(target)).is_some()
    }

    pub fn disable(&mut self, tool_type: ToolType) {
        with_tool!(self, tool_type, |tool, target| tool.disable(target));
    }

    pub fn apply(&mut self, tool_type: ToolType) -> Option<ToolCommit> {
        with_tool!(self, tool_type, |tool, target| tool.apply(target)).flatten()
    }

    pub fn cancel(&mut self, tool_type: ToolType) {
        with_tool!(self, tool_type, |tool, target| tool.cancel(target));
    }

    pub fn delete_selection(&mut self, tool_type: ToolType) -> Option<ToolCommit> {
        with_tool!(self, tool_type, |tool, target| tool.delete_selection(target)).flatten()
    }

    pub fn handle_pointer(&mut self, tool_type: ToolType, event: &MapPointerEvent) {
        with_tool!(self, tool_type, |tool, target| tool.handle_pointer(target, event));
    }

    pub fn zone_tool(&mut self) -> Option<&mut ZoneTool> {
        self.zone.as_deref_mut()
    }
}

/// System handling tool selection events: the previous tool is disabled
/// (discarding its uncommitted edit) before the requested one is enabled.
pub fn handle_tool_selection_events(
    mut events: EventReader<ToolSelectionEvent>,
    mut tool_manager: ResMut<ToolManager>,
    mut tools: MapTools,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        if tool_manager.is_tool_active(event.tool_type) {
            continue;
        }
        if !tools.is_ready() {
            warn!(
                "Tool {} requested before the map finished loading",
                event.tool_type.to_string()
            );
            continue;
        }

        if let Some(previous) = tool_manager.deactivate_current_tool() {
            tools.disable(previous);
        }

        if !tools.enable(event.tool_type) {
            error!("Tool {} is not available", event.tool_type.to_string());
            continue;
        }
        tool_manager.activate_tool(event.tool_type);
        info!(
            "{} tool activated via {}",
            event.tool_type.to_string(),
            event.source.to_string()
        );

        rpc_interface.send_notification(
            "tool_state_changed",
            serde_json::json!({
                "tool": event.tool_type.to_string(),
                "active": true,
                "source": event.source.to_string()
            }),
        );
    }
}

pub fn handle_clear_tool_events(
    mut events: EventReader<ClearToolEvent>,
    mut tool_manager: ResMut<ToolManager>,
    mut tools: MapTools,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let Some(previous) = tool_manager.deactivate_current_tool() else {
            continue;
        };
        tools.disable(previous);

        rpc_interface.send_notification(
            "tool_state_changed",
            serde_json::json!({
                "tool": previous.to_string(),
                "active": false,
                "source": event.source.to_string()
            }),
        );
    }
}

/// System running apply/cancel/delete on the active tool and reporting commits.
pub fn handle_tool_action_events(
    mut events: EventReader<ToolActionEvent>,
    tool_manager: Res<ToolManager>,
    mut tools: MapTools,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let Some(active) = tool_manager.active_tool() else {
            debug!("{:?} ignored, no active tool", event.action);
            continue;
        };

        let commit = match event.action {
            ToolAction::Apply => tools.apply(active),
            ToolAction::DeleteSelection => tools.delete_selection(active),
            ToolAction::Cancel => {
                tools.cancel(active);
                info!("{} edit cancelled", active.to_string());
                rpc_interface.send_notification(
                    "tool_cancelled",
                    serde_json::json!({ "tool": active.to_string() }),
                );
                None
            }
        };

        let Some(commit) = commit else {
            continue;
        };
        match serde_json::to_value(&commit) {
            Ok(record) => rpc_interface.send_notification(
                "tool_committed",
                serde_json::json!({
                    "tool": active.to_string(),
                    "record": record
                }),
            ),
            Err(e) => error!("Failed to serialise commit: {}", e),
        }
    }
}

pub fn handle_zone_style_events(
    mut events: EventReader<ZoneStyleEvent>,
    mut tools: MapTools,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let Some(zone) = tools.zone_tool() else {
            continue;
        };
        zone.set_kind(event.kind);
        if let Some(style) = event.style {
            zone.set_style(style);
        }

        rpc_interface.send_notification(
            "tool_state_changed",
            serde_json::json!({
                "tool": ToolType::Zone.to_string(),
                "kind": zone.kind(),
                "style": zone.style()
            }),
        );
    }
}

pub fn handle_zone_interaction_events(
    mut events: EventReader<ZoneInteractionEvent>,
    mut tools: MapTools,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let Some(zone) = tools.zone_tool() else {
            continue;
        };
        zone.set_interaction(event.interaction);

        rpc_interface.send_notification(
            "tool_state_changed",
            serde_json::json!({
                "tool": ToolType::Zone.to_string(),
                "interaction": event.interaction.to_string()
            }),
        );
    }
}

/// Deliver resolved pointer events to the active tool.
pub fn route_pointer_to_active_tool(
    mut events: EventReader<MapPointerEvent>,
    tool_manager: Res<ToolManager>,
    mut tools: MapTools,
) {
    let Some(active) = tool_manager.active_tool() else {
        events.clear();
        return;
    };

    for event in events.read() {
        tools.handle_pointer(active, event);
    }
}

/// System handling keyboard shortcuts for tools (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_tool_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    zone_tool: Option<Res<ZoneTool>>,
    mut tool_events: EventWriter<ToolSelectionEvent>,
    mut action_events: EventWriter<ToolActionEvent>,
    mut zone_style_events: EventWriter<ZoneStyleEvent>,
    mut zone_interaction_events: EventWriter<ZoneInteractionEvent>,
) {
    // Ctrl+S belongs to the save shortcut.
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    let source = ToolSelectionSource::Keyboard;

    let selections = [
        (KeyCode::KeyW, ToolType::Wall(WallMode::Draw)),
        (KeyCode::KeyE, ToolType::Wall(WallMode::Erase)),
        (KeyCode::KeyF, ToolType::Floor(FloorMode::Polygon)),
        (KeyCode::KeyR, ToolType::Floor(FloorMode::Eraser)),
        (KeyCode::KeyZ, ToolType::Zone),
        (KeyCode::KeyP, ToolType::PoseEstimate),
    ];
    for (key, tool_type) in selections {
        if !ctrl && keyboard.just_pressed(key) {
            tool_events.write(ToolSelectionEvent { tool_type, source });
        }
    }

    let actions = [
        (KeyCode::Enter, ToolAction::Apply),
        (KeyCode::Escape, ToolAction::Cancel),
        (KeyCode::Delete, ToolAction::DeleteSelection),
        (KeyCode::Backspace, ToolAction::DeleteSelection),
    ];
    for (key, action) in actions {
        if keyboard.just_pressed(key) {
            action_events.write(ToolActionEvent { action, source });
        }
    }

    for (key, kind) in [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3]
        .into_iter()
        .zip(ZoneKind::ALL)
    {
        if keyboard.just_pressed(key) {
            zone_style_events.write(ZoneStyleEvent { kind, style: None });
        }
    }

    if keyboard.just_pressed(KeyCode::Tab) {
        if let Some(zone_tool) = zone_tool {
            zone_interaction_events.write(ZoneInteractionEvent {
                interaction: zone_tool.interaction().toggled(),
            });
        }
    }
}

/// Placeholder system for WASM builds where keyboard shortcuts are disabled.
#[cfg(target_arch = "wasm32")]
pub fn handle_tool_keyboard_shortcuts() {
    // Tools are driven by the host page over RPC.
}
