//! JSON-RPC 2.0 communication layer for the hosting web shell.
//!
//! Implements bidirectional messaging between the Bevy engine and the shell
//! via iframe postMessage, supporting both request-response and notification
//! patterns. Native builds keep the same systems but drop outgoing messages.
//!
//! ## Message Flow
//!
//! ```text
//! Web shell (parent window)  <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ parse_command()
//!        │                                        ├─ dispatch as Bevy event
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        ├─ Notification (no ID) ───────────────> │  executed, never answered
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! Pointer streams should be sent as notifications to avoid one response
//! per mouse move.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Methods
//!
//! ### Tool Management
//! - `tool_selection` `{ tool }`: `wall`, `wall_eraser`, `floor_eraser`,
//!   `floor_polygon`, `zone` or `pose_estimate`
//! - `clear_tool`: deactivate the current tool, discarding its edit
//! - `tool_action` `{ action }`: `apply`, `cancel` or `delete_selection`
//! - `get_active_tool`: name of the active tool or `null`
//!
//! ### Zones
//! - `set_zone_style` `{ kind, style? }`: pick the kind for new zones
//! - `set_zone_interaction` `{ interaction }`: `create` or `select`
//!
//! ### Input and Data
//! - `pointer_event` `{ type, screenX, screenY }`: viewport pointer input
//! - `set_sensor_cloud` `{ points }`: replace the live sensor scan
//! - `save_map`: write the edited map (native only)
//!
//! ## Notifications Sent
//!
//! - `tool_state_changed`: activation, deactivation, zone kind or mode
//! - `tool_committed` `{ tool, record }`: wall, floor, zone or pose record
//! - `tool_cancelled` `{ tool }`
//! - `map_saved` `{ path, bytes }`
//! - `loading_progress` `{ manifest, raster, session, failed }`

/// JSON-RPC 2.0 bidirectional communication system for the web shell.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
