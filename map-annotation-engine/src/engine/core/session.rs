use bevy::prelude::*;
use std::sync::Arc;

/// Identity and start time of the map editing session.
///
/// Tools receive a shared `Arc<EditSession>` at construction and stamp
/// committed records with it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub map_id: String,
    pub site_id: String,
    /// Seconds since the Unix epoch when the session started.
    pub started_at: f64,
}

impl EditSession {
    pub fn new(map_id: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self::starting_at(map_id, site_id, unix_time_secs())
    }

    pub fn starting_at(
        map_id: impl Into<String>,
        site_id: impl Into<String>,
        started_at: f64,
    ) -> Self {
        Self {
            map_id: map_id.into(),
            site_id: site_id.into(),
            started_at,
        }
    }

    /// Wall-clock timestamp for an instant `elapsed` seconds into the session.
    pub fn timestamp(&self, elapsed: f64) -> f64 {
        self.started_at + elapsed
    }
}

/// Shared handle inserted once the manifest names the map and site.
#[derive(Resource, Debug, Clone)]
pub struct SessionContext(pub Arc<EditSession>);

fn unix_time_secs() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() / 1000.0
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default()
    }
}
