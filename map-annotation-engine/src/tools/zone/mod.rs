//! Semantic zone annotation.
//!
//! Zones are polygons tagged with a `ZoneKind` (preferred, forbidden,
//! critical). They never touch the occupancy grid; instead every committed
//! zone is rasterised into a separate transparent overlay that is drawn just
//! above the map quad.
//!
//! ## Interaction
//!
//! The tool runs in one of two interactions, toggled with Tab, the panel
//! button or the `set_zone_interaction` RPC:
//!
//! ### Create
//! - Click adds a node; click on an existing node selects it and drags it
//! - Apply closes the outline into a new zone record
//!
//! ### Select
//! - Click inside a committed zone loads its outline into the node editor
//! - Apply replaces that record; Delete removes the selected node, or the
//!   whole zone when no node is selected
//!
//! Any change rebuilds the overlay from the full record list, so overlapping
//! zones are painted in record order.

/// Zone records and their rasterised overlay.
pub mod layer;

/// Style panel with one button per zone kind (native only).
///
/// Switches to a compact layout on narrow viewports.
pub mod panel;

/// Zone drawing and selection tool with its preview system.
pub mod tool;

use bevy::prelude::*;
use panel::ZonePanelState;

// Registers the zone style panel and its systems.
pub struct ZonePanelPlugin;

impl Plugin for ZonePanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ZonePanelState>();

        // The web shell draws its own panel.
        #[cfg(not(target_arch = "wasm32"))]
        {
            use crate::engine::core::resize::propagate_resize;
            use panel::{
                apply_zone_panel_layout, reflect_zone_panel, spawn_zone_panel,
                zone_interaction_button, zone_kind_button_interaction,
            };

            app.add_systems(Startup, spawn_zone_panel).add_systems(
                Update,
                (
                    propagate_resize::<ZonePanelState>,
                    apply_zone_panel_layout,
                    zone_kind_button_interaction,
                    zone_interaction_button,
                    reflect_zone_panel,
                ),
            );
        }
    }
}
