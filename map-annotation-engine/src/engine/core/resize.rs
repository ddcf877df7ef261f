use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

/// Implemented by resources whose layout depends on the viewport size.
pub trait Resizable {
    fn on_resize(&mut self, size: Vec2);
}

/// Forward primary-window resizes to a `Resizable` resource.
pub fn propagate_resize<T: Resizable + Resource>(
    mut resized: EventReader<WindowResized>,
    windows: Query<Entity, With<PrimaryWindow>>,
    target: Option<ResMut<T>>,
) {
    let Some(mut target) = target else {
        resized.clear();
        return;
    };
    let Ok(primary) = windows.single() else {
        return;
    };

    // Only the latest size matters when several arrive in one frame.
    if let Some(event) = resized.read().filter(|e| e.window == primary).last() {
        target.on_resize(Vec2::new(event.width, event.height));
    }
}
