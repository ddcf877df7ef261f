use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::render_settings::CLEAR_COLOUR;
// Crate engine modules
use crate::engine::assets::editor_manifest::EditorManifest;
use crate::engine::assets::map_raster::{MapRaster, MapRasterLoader};
use crate::engine::camera::viewport_camera::{ViewportCamera, camera_controller};
use crate::engine::core::app_state::{AppState, transition_to_running, update_loading_frontend};
use crate::engine::core::resize::propagate_resize;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::{
    ManifestLoader, create_session_when_ready, load_manifest_system, start_loading,
};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::map::map_render::{spawn_map_surfaces, sync_map_textures};
use crate::engine::map::persistence::{SaveMapEvent, handle_save_shortcut, save_map_on_request};
// Crate tools modules
use crate::tools::floor::update_floor_preview;
use crate::tools::pointer::{MapPointerEvent, PointerEvent, resolve_pointer_events};
use crate::tools::pose::{advance_pose_clock, refresh_pose_on_robot_change, update_pose_overlay};
use crate::tools::tool_manager::{
    ClearToolEvent, ToolActionEvent, ToolManager, ToolSelectionEvent, ZoneInteractionEvent,
    ZoneStyleEvent, handle_clear_tool_events, handle_tool_action_events,
    handle_tool_keyboard_shortcuts, handle_tool_selection_events, handle_zone_interaction_events,
    handle_zone_style_events, route_pointer_to_active_tool,
};
use crate::tools::wall::update_wall_preview;
use crate::tools::zone::ZonePanelPlugin;
use crate::tools::zone::tool::update_zone_preview;
// Web RPC
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::tools::pointer::emit_mouse_pointer_events;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        // Registers EditorManifest as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<EditorManifest>::new(&["json"]))
        .init_asset::<MapRaster>()
        .init_asset_loader::<MapRasterLoader>()
        .add_plugins(WebRpcPlugin)
        .add_plugins(ZonePanelPlugin)
        .insert_resource(ClearColor(CLEAR_COLOUR));

    // Initialise resources early
    app.init_resource::<LoadingProgress>()
        .init_resource::<ManifestLoader>()
        .init_resource::<ToolManager>()
        .add_event::<PointerEvent>()
        .add_event::<MapPointerEvent>()
        .add_event::<ToolSelectionEvent>()
        .add_event::<ClearToolEvent>()
        .add_event::<ToolActionEvent>()
        .add_event::<ZoneStyleEvent>()
        .add_event::<ZoneInteractionEvent>()
        .add_event::<SaveMapEvent>();

    // State-based system scheduling
    app.add_systems(Startup, start_loading)
        .add_systems(
            Update,
            (
                load_manifest_system,
                create_session_when_ready,
                transition_to_running,
            )
                .chain()
                .run_if(in_state(AppState::Loading)),
        )
        .add_systems(Update, update_loading_frontend)
        .add_systems(OnEnter(AppState::Running), spawn_map_surfaces);

    // Input is resolved and routed in order so a press lands on the tool
    // selected in the same frame.
    let input_systems = (
        handle_tool_keyboard_shortcuts, // Native shortcuts or no-op for WASM
        handle_save_shortcut,
        resolve_pointer_events,
        handle_tool_selection_events,
        handle_clear_tool_events,
        handle_zone_style_events,
        handle_zone_interaction_events,
        route_pointer_to_active_tool,
        handle_tool_action_events,
        save_map_on_request,
    )
        .chain();

    let runtime_systems = (
        camera_controller,
        propagate_resize::<ViewportCamera>,
        advance_pose_clock,
        refresh_pose_on_robot_change,
    );

    let preview_systems = (
        update_wall_preview,
        update_floor_preview,
        update_zone_preview,
        update_pose_overlay,
    );

    app.add_systems(
        Update,
        (input_systems, runtime_systems, preview_systems)
            .chain()
            .run_if(in_state(AppState::Running)),
    )
    .add_systems(
        PostUpdate,
        sync_map_textures.run_if(in_state(AppState::Running)),
    );

    // The web shell forwards pointer input over RPC instead.
    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(
            Update,
            emit_mouse_pointer_events
                .before(resolve_pointer_events)
                .run_if(in_state(AppState::Running)),
        );
    }

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
