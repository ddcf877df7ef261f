use crate::engine::loading::progress::LoadingProgress;
use crate::rpc::web_rpc::WebRpcInterface;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}

// Final transition to running state
pub fn transition_to_running(
    loading_progress: Res<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if loading_progress.session_created {
        info!("→ Map session ready, transitioning to Running state");
        next_state.set(AppState::Running);
    }
}

/// Report loading stages to the host shell as they complete.
pub fn update_loading_frontend(
    loading_progress: Res<LoadingProgress>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !loading_progress.is_changed() {
        return;
    }

    rpc_interface.send_notification(
        "loading_progress",
        serde_json::json!({
            "manifest": loading_progress.manifest_loaded,
            "raster": loading_progress.raster_loaded,
            "session": loading_progress.session_created,
            "failed": loading_progress.failed
        }),
    );
}
