use bevy::prelude::*;
use constants::occupancy::{FREE, OCCUPIED};
use map_annotation_engine::engine::assets::robot_model::RobotModel;
use map_annotation_engine::engine::core::session::EditSession;
use map_annotation_engine::engine::map::occupancy_grid::{MapInfo, OccupancyGrid};
use map_annotation_engine::rpc::web_rpc::WebRpcInterface;
use map_annotation_engine::tools::floor::{FloorMode, FloorTool};
use map_annotation_engine::tools::pointer::{MapPointerEvent, PointerKind};
use map_annotation_engine::tools::pose::tool::PoseEstimateTool;
use map_annotation_engine::tools::settings::ToolSettingsSet;
use map_annotation_engine::tools::tool_manager::{
    ClearToolEvent, ToolAction, ToolActionEvent, ToolManager, ToolSelectionEvent,
    ToolSelectionSource, ToolType, ZoneInteractionEvent, ZoneStyleEvent,
    handle_clear_tool_events, handle_tool_action_events, handle_tool_selection_events,
    route_pointer_to_active_tool,
};
use map_annotation_engine::tools::wall::{WallMode, WallTool};
use map_annotation_engine::tools::zone::layer::ZoneLayer;
use map_annotation_engine::tools::zone::tool::ZoneTool;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Headless app with the tool pipeline over a 60x60 free map with one wall row.
fn editor_app() -> App {
    let info = MapInfo::new(60, 60, 0.05, Vec2::ZERO).unwrap();
    let mut grid = OccupancyGrid::filled(info, FREE);
    for x in 0..60 {
        grid.put_pixel(IVec2::new(x, 30), OCCUPIED);
    }

    let session = Arc::new(EditSession::starting_at("office", "hq", 0.0));
    let settings = ToolSettingsSet::default();

    let mut app = App::new();
    app.add_event::<ToolSelectionEvent>()
        .add_event::<ClearToolEvent>()
        .add_event::<ToolActionEvent>()
        .add_event::<ZoneStyleEvent>()
        .add_event::<ZoneInteractionEvent>()
        .add_event::<MapPointerEvent>()
        .init_resource::<WebRpcInterface>()
        .init_resource::<ToolManager>()
        .insert_resource(grid)
        .insert_resource(ZoneLayer::new(info))
        .insert_resource(RobotModel::default())
        .insert_resource(WallTool::new(session.clone(), settings.wall, info.resolution))
        .insert_resource(FloorTool::new(session.clone(), settings.floor))
        .insert_resource(ZoneTool::new(session.clone(), settings.zone))
        .insert_resource(PoseEstimateTool::new(session, settings.pose))
        .add_systems(
            Update,
            (
                handle_tool_selection_events,
                handle_clear_tool_events,
                route_pointer_to_active_tool,
                handle_tool_action_events,
            )
                .chain(),
        );
    app
}

fn select(app: &mut App, tool_type: ToolType) {
    app.world_mut().send_event(ToolSelectionEvent {
        tool_type,
        source: ToolSelectionSource::Rpc,
    });
}

fn pointer(app: &mut App, kind: PointerKind, world: Vec2) {
    app.world_mut().send_event(MapPointerEvent {
        kind,
        world: Some(world),
    });
}

fn action(app: &mut App, action: ToolAction) {
    app.world_mut().send_event(ToolActionEvent {
        action,
        source: ToolSelectionSource::Rpc,
    });
}

fn grid_bytes(app: &App) -> Vec<u8> {
    app.world().resource::<OccupancyGrid>().as_raw().to_vec()
}

fn notification_methods(app: &App) -> Vec<String> {
    app.world()
        .resource::<WebRpcInterface>()
        .pending_notifications()
        .iter()
        .map(|notification| notification.method.clone())
        .collect()
}

#[test]
fn switching_tools_discards_the_uncommitted_edit() {
    let mut app = editor_app();
    let original = grid_bytes(&app);

    select(&mut app, ToolType::Floor(FloorMode::Eraser));
    pointer(&mut app, PointerKind::Down, Vec2::new(1.0, 1.525));
    pointer(&mut app, PointerKind::Move, Vec2::new(2.0, 1.525));
    pointer(&mut app, PointerKind::Up, Vec2::new(2.0, 1.525));
    app.update();
    assert_ne!(grid_bytes(&app), original);

    select(&mut app, ToolType::Wall(WallMode::Draw));
    app.update();

    assert_eq!(grid_bytes(&app), original);
    assert_eq!(
        app.world().resource::<ToolManager>().active_tool(),
        Some(ToolType::Wall(WallMode::Draw))
    );
}

#[test]
fn applied_walls_survive_a_tool_switch() {
    let mut app = editor_app();

    select(&mut app, ToolType::Wall(WallMode::Draw));
    for world in [Vec2::new(0.5, 0.5), Vec2::new(2.5, 0.5)] {
        pointer(&mut app, PointerKind::Down, world);
        pointer(&mut app, PointerKind::Up, world);
    }
    action(&mut app, ToolAction::Apply);
    app.update();
    let committed = grid_bytes(&app);

    select(&mut app, ToolType::Zone);
    app.update();

    assert_eq!(grid_bytes(&app), committed);
    let grid = app.world().resource::<OccupancyGrid>();
    assert_eq!(grid.pixel(IVec2::new(25, 10)), Some(OCCUPIED));
    assert_eq!(
        notification_methods(&app),
        vec!["tool_state_changed", "tool_committed", "tool_state_changed"]
    );
}

#[test]
fn clearing_the_tool_cancels_and_deactivates() {
    let mut app = editor_app();
    let original = grid_bytes(&app);

    select(&mut app, ToolType::Wall(WallMode::Erase));
    pointer(&mut app, PointerKind::Down, Vec2::new(1.5, 1.525));
    pointer(&mut app, PointerKind::Up, Vec2::new(1.5, 1.525));
    app.update();
    assert_ne!(grid_bytes(&app), original);

    app.world_mut().send_event(ClearToolEvent {
        source: ToolSelectionSource::Keyboard,
    });
    app.update();

    assert_eq!(grid_bytes(&app), original);
    assert_eq!(app.world().resource::<ToolManager>().active_tool(), None);
}

#[test]
fn pointer_input_without_an_active_tool_is_dropped() {
    let mut app = editor_app();
    let original = grid_bytes(&app);

    pointer(&mut app, PointerKind::Down, Vec2::new(1.5, 1.525));
    pointer(&mut app, PointerKind::Up, Vec2::new(1.5, 1.525));
    action(&mut app, ToolAction::Apply);
    app.update();

    assert_eq!(grid_bytes(&app), original);
    assert!(notification_methods(&app).is_empty());
}
