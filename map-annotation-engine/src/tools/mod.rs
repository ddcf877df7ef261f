//! Interactive tools for occupancy map annotation.
//!
//! Provides wall drawing and erasing, floor clearing, semantic zone
//! annotation and robot pose estimation, coordinated by a single tool
//! manager and controllable from keyboard shortcuts (native) or JSON-RPC
//! (web shell).
//!
//! ## Tool Manager Architecture
//!
//! The `ToolManager` resource maintains exclusive tool activation state:
//! - Only one tool can be active at a time
//! - Switching tools disables the previous one, which discards its
//!   uncommitted edit exactly like Cancel
//! - Every tool snapshots its target on activation and again after each
//!   successful Apply
//!
//! ### Tool Activation Flow
//!
//! ```text
//! Keyboard/RPC Input
//!   └─> ToolSelectionEvent
//!       └─> handle_tool_selection_events()
//!           ├─> Disable previous tool (restores its snapshot)
//!           ├─> Enable requested tool (takes a new snapshot)
//!           └─> Send tool_state_changed notification
//! ```
//!
//! ### Pointer Flow
//!
//! ```text
//! Mouse (native) / pointer_event RPC (web)
//!   └─> PointerEvent { kind, screen }
//!       └─> resolve_pointer_events()   camera ray ∩ map plane
//!           └─> MapPointerEvent { kind, world }
//!               └─> route_pointer_to_active_tool()
//! ```
//!
//! ## Available Tools
//!
//! ### Wall Tool (`ToolType::Wall`)
//! - **Activation**: `W` (draw) / `E` (erase), or `tool_selection` RPC with
//!   `"wall"` / `"wall_eraser"`
//! - **Draw**: clicks build a polyline; each segment previews as a quad of the
//!   configured pixel width. Apply rasterises every segment as occupied.
//! - **Erase**: a round brush that clears occupied pixels only.
//!
//! ### Floor Tool (`ToolType::Floor`)
//! - **Activation**: `F` (polygon) / `R` (eraser), or `"floor_polygon"` /
//!   `"floor_eraser"`
//! - **Polygon**: clicks build an outline; Apply fills it as free space.
//! - **Eraser**: a round brush that clears any pixel to free space.
//!
//! ### Zone Tool (`ToolType::Zone`)
//! - **Activation**: `Z` or `"zone"`
//! - Draws and edits kind-tagged polygons on a separate overlay; see
//!   [`zone`] for the create/select interaction.
//!
//! ### Pose Estimate Tool (`ToolType::PoseEstimate`)
//! - **Activation**: `P` or `"pose_estimate"`
//! - Drag on the robot footprint to move it, drag elsewhere to rotate it.
//!   Apply emits the pose with a wall-clock timestamp.
//!
//! ## Shared Actions
//!
//! - `Enter` / `tool_action "apply"`: commit, emitting a `tool_committed`
//!   notification with the tool's record
//! - `Escape` / `tool_action "cancel"`: restore the last snapshot
//! - `Delete` / `tool_action "delete_selection"`: remove the selected node
//!   (or zone)

/// Floor clearing tool: free-space brush and polygon fill.
pub mod floor;

/// Lifecycle trait shared by every tool plus the brush press state.
pub mod map_tool;

/// Node list editing shared by the polyline and polygon tools.
///
/// Handles hit-testing, selection, dragging and deletion of nodes.
pub mod nodes;

/// Pointer events in screen and map space.
pub mod pointer;

/// Robot pose estimation tool and overlay.
pub mod pose;

/// Preview mesh helpers used by every tool's overlay system.
pub mod preview;

/// Serialisable records emitted on commit.
pub mod records;

/// Per-tool settings read from the editor manifest.
pub mod settings;

/// Unified tool manager coordinating exclusive tool activation and state.
///
/// Handles tool selection and action events from keyboard shortcuts and RPC
/// with frontend notifications.
pub mod tool_manager;

/// Wall polyline drawing and occupied-pixel eraser.
pub mod wall;

/// Semantic zone annotation with overlay and style panel.
pub mod zone;
