use crate::engine::camera::viewport_camera::MapCamera;
use crate::engine::map::coordinate_mapper::CoordinateMapper;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Pointer input in viewport coordinates, from the mouse or the host shell.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen: Vec2,
}

/// Pointer input resolved onto the map plane. `world` is `None` when the
/// pointer is off the map.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MapPointerEvent {
    pub kind: PointerKind,
    pub world: Option<Vec2>,
}

/// Turn left mouse button and cursor input into pointer events.
///
/// Presses over UI buttons belong to the UI and are not forwarded.
pub fn emit_mouse_pointer_events(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: EventReader<CursorMoved>,
    windows: Query<&Window, With<PrimaryWindow>>,
    ui_buttons: Query<&Interaction>,
    mut pointer_events: EventWriter<PointerEvent>,
) {
    for cursor in cursor_moved.read() {
        pointer_events.write(PointerEvent {
            kind: PointerKind::Move,
            screen: cursor.position,
        });
    }

    let cursor = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position());

    if mouse_button.just_pressed(MouseButton::Left) {
        let over_ui = ui_buttons
            .iter()
            .any(|interaction| *interaction != Interaction::None);

        if let (Some(screen), false) = (cursor, over_ui) {
            pointer_events.write(PointerEvent {
                kind: PointerKind::Down,
                screen,
            });
        }
    }

    if mouse_button.just_released(MouseButton::Left) {
        pointer_events.write(PointerEvent {
            kind: PointerKind::Up,
            screen: cursor.unwrap_or_default(),
        });
    }
}

/// Resolve screen-space pointer events through the coordinate mapper.
pub fn resolve_pointer_events(
    mut pointer_events: EventReader<PointerEvent>,
    mapper: Option<Res<CoordinateMapper>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
    mut map_events: EventWriter<MapPointerEvent>,
) {
    let Some(mapper) = mapper else {
        pointer_events.clear();
        return;
    };
    let camera = cameras.single().ok();

    for event in pointer_events.read() {
        let world = camera.and_then(|(camera, transform)| {
            mapper.screen_to_world(camera, transform, event.screen)
        });

        if world.is_none() && event.kind != PointerKind::Up {
            debug!("Pointer {:?} at {} is off the map", event.kind, event.screen);
        }

        map_events.write(MapPointerEvent {
            kind: event.kind,
            world,
        });
    }
}
