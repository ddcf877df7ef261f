use bevy::prelude::*;

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub manifest_loaded: bool,
    pub raster_loaded: bool,
    pub session_created: bool,
    /// Set when any stage failed; loading stops there.
    pub failed: bool,
}
