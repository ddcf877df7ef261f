use crate::tools::pointer::{MapPointerEvent, PointerKind};
use crate::tools::records::ToolCommit;
use bevy::prelude::*;

/// Lifecycle shared by every map editing tool.
///
/// `Target` is the state the tool edits: the occupancy grid, the zone layer or
/// the robot model. The tool manager calls `enable` on activation and
/// `disable` when another tool takes over; disabling discards any uncommitted
/// edit exactly like `cancel`.
pub trait MapTool {
    type Target;

    fn is_enabled(&self) -> bool;

    /// Take the rollback snapshot and start accepting pointer input.
    fn enable(&mut self, target: &mut Self::Target);

    fn disable(&mut self, target: &mut Self::Target);

    fn pointer_down(&mut self, target: &mut Self::Target, world: Vec2);

    fn pointer_move(&mut self, target: &mut Self::Target, world: Vec2);

    fn pointer_up(&mut self, target: &mut Self::Target);

    /// Commit the in-progress edit. `None` when there was nothing to commit.
    fn apply(&mut self, target: &mut Self::Target) -> Option<ToolCommit>;

    /// Restore the target to the last snapshot and drop in-progress state.
    fn cancel(&mut self, target: &mut Self::Target);

    /// Delete whatever the tool has selected.
    fn delete_selection(&mut self, _target: &mut Self::Target) -> Option<ToolCommit> {
        None
    }

    /// Route a resolved pointer event. Down and move need a world position,
    /// up is always delivered so a drag can end off the map.
    fn handle_pointer(&mut self, target: &mut Self::Target, event: &MapPointerEvent) {
        if !self.is_enabled() {
            return;
        }

        match (event.kind, event.world) {
            (PointerKind::Down, Some(world)) => self.pointer_down(target, world),
            (PointerKind::Move, Some(world)) => self.pointer_move(target, world),
            (PointerKind::Up, _) => self.pointer_up(target),
            _ => {}
        }
    }
}

/// Press-and-hold state of a brush: strokes only land while `Erasing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushState {
    #[default]
    Idle,
    Erasing,
}
