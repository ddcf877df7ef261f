use crate::engine::core::resize::Resizable;
use crate::tools::records::ZoneKind;
use crate::tools::tool_manager::{
    ToolManager, ToolType, ZoneInteractionEvent, ZoneStyleEvent,
};
use crate::tools::zone::tool::{ZoneInteraction, ZoneTool};
use bevy::prelude::*;

const BUTTON_COLOUR: Color = Color::srgb(0.22, 0.24, 0.28);
const BUTTON_HOVER_COLOUR: Color = Color::srgb(0.26, 0.28, 0.32);
const BUTTON_PRESSED_COLOUR: Color = Color::srgb(0.18, 0.20, 0.24);
const SELECTED_BORDER_COLOUR: Color = Color::srgb(1.0, 1.0, 1.0);
const IDLE_BORDER_COLOUR: Color = Color::srgba(0.0, 0.0, 0.0, 0.25);

/// Layout of the zone style panel. Narrow viewports get the compact variant.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ZonePanelState {
    pub compact: bool,
    pub open_width: f32,
    pub compact_width: f32,
    /// Viewport width below which the panel switches to compact.
    pub breakpoint: f32,
}

impl Default for ZonePanelState {
    fn default() -> Self {
        Self {
            compact: false,
            open_width: 220.0,
            compact_width: 120.0,
            breakpoint: 900.0,
        }
    }
}

impl ZonePanelState {
    pub fn width(&self) -> f32 {
        if self.compact {
            self.compact_width
        } else {
            self.open_width
        }
    }

    fn font_size(&self) -> f32 {
        if self.compact { 13.0 } else { 16.0 }
    }
}

impl Resizable for ZonePanelState {
    fn on_resize(&mut self, size: Vec2) {
        let compact = size.x < self.breakpoint;
        if self.compact != compact {
            self.compact = compact;
        }
    }
}

#[derive(Component)]
pub struct ZonePanelRoot;

#[derive(Component)]
pub struct ZoneKindButton(pub ZoneKind);

#[derive(Component)]
pub struct ZoneInteractionButton;

#[derive(Component)]
pub struct ZoneInteractionLabel;

#[derive(Component)]
pub struct ZonePanelText;

fn kind_label(kind: ZoneKind) -> &'static str {
    match kind {
        ZoneKind::Preferred => "Preferred",
        ZoneKind::Forbidden => "Forbidden",
        ZoneKind::Critical => "Critical",
    }
}

fn interaction_label(interaction: ZoneInteraction) -> &'static str {
    match interaction {
        ZoneInteraction::Create => "Mode: Create",
        ZoneInteraction::Select => "Mode: Select",
    }
}

fn button_node() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Px(32.0),
        display: Display::Flex,
        align_items: AlignItems::Center,
        justify_content: JustifyContent::FlexStart,
        column_gap: Val::Px(8.0),
        padding: UiRect::horizontal(Val::Px(8.0)),
        border: UiRect::all(Val::Px(1.0)),
        ..default()
    }
}

/// Spawn the zone panel hidden; it shows while the zone tool is active.
pub fn spawn_zone_panel(mut commands: Commands, state: Res<ZonePanelState>) {
    let font_size = state.font_size();

    commands
        .spawn((
            ZonePanelRoot,
            Name::new("ZonePanel"),
            BackgroundColor(Color::srgb(0.10, 0.11, 0.13)),
            Node {
                width: Val::Px(state.width()),
                position_type: PositionType::Absolute,
                right: Val::Px(0.0),
                top: Val::Px(0.0),
                padding: UiRect::all(Val::Px(10.0)),
                row_gap: Val::Px(6.0),
                display: Display::None,
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Stretch,
                ..default()
            },
        ))
        .with_children(|panel| {
            panel.spawn((
                ZonePanelText,
                Text::new("Zones"),
                TextFont {
                    font_size: font_size + 2.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));

            for kind in ZoneKind::ALL {
                panel
                    .spawn((
                        ZoneKindButton(kind),
                        Button,
                        Name::new(format!("ZoneKind{}", kind_label(kind))),
                        BackgroundColor(BUTTON_COLOUR),
                        BorderColor(IDLE_BORDER_COLOUR),
                        button_node(),
                    ))
                    .with_children(|button| {
                        button.spawn((
                            BackgroundColor(kind.default_style().bevy_colour().with_alpha(1.0)),
                            Node {
                                width: Val::Px(12.0),
                                height: Val::Px(12.0),
                                ..default()
                            },
                        ));
                        button.spawn((
                            ZonePanelText,
                            Text::new(kind_label(kind)),
                            TextFont {
                                font_size,
                                ..default()
                            },
                            TextColor(Color::WHITE),
                        ));
                    });
            }

            panel
                .spawn((
                    ZoneInteractionButton,
                    Button,
                    Name::new("ZoneInteractionButton"),
                    BackgroundColor(BUTTON_COLOUR),
                    BorderColor(IDLE_BORDER_COLOUR),
                    button_node(),
                ))
                .with_children(|button| {
                    button.spawn((
                        ZoneInteractionLabel,
                        ZonePanelText,
                        Text::new(interaction_label(ZoneInteraction::Create)),
                        TextFont {
                            font_size,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

// Kind buttons pick the kind with its default style
pub fn zone_kind_button_interaction(
    mut q: Query<
        (&Interaction, &ZoneKindButton, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut style_events: EventWriter<ZoneStyleEvent>,
) {
    for (interaction, button, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                style_events.write(ZoneStyleEvent {
                    kind: button.0,
                    style: None,
                });
                *bg = BackgroundColor(BUTTON_PRESSED_COLOUR);
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVER_COLOUR),
            Interaction::None => *bg = BackgroundColor(BUTTON_COLOUR),
        }
    }
}

pub fn zone_interaction_button(
    mut q: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>, With<ZoneInteractionButton>),
    >,
    zone_tool: Option<Res<ZoneTool>>,
    mut interaction_events: EventWriter<ZoneInteractionEvent>,
) {
    for (interaction, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                if let Some(zone_tool) = zone_tool.as_ref() {
                    interaction_events.write(ZoneInteractionEvent {
                        interaction: zone_tool.interaction().toggled(),
                    });
                }
                *bg = BackgroundColor(BUTTON_PRESSED_COLOUR);
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVER_COLOUR),
            Interaction::None => *bg = BackgroundColor(BUTTON_COLOUR),
        }
    }
}

/// Show the panel with the zone tool and mirror the tool's kind and mode.
pub fn reflect_zone_panel(
    tool_manager: Res<ToolManager>,
    zone_tool: Option<Res<ZoneTool>>,
    mut roots: Query<&mut Node, With<ZonePanelRoot>>,
    mut kind_buttons: Query<(&ZoneKindButton, &mut BorderColor)>,
    mut labels: Query<&mut Text, With<ZoneInteractionLabel>>,
) {
    let tool_changed = zone_tool.as_ref().is_some_and(|tool| tool.is_changed());
    if !tool_manager.is_changed() && !tool_changed {
        return;
    }

    let visible = tool_manager.is_tool_active(ToolType::Zone);
    if let Ok(mut node) = roots.single_mut() {
        node.display = if visible { Display::Flex } else { Display::None };
    }

    let Some(zone_tool) = zone_tool else {
        return;
    };
    for (button, mut border) in &mut kind_buttons {
        *border = BorderColor(if button.0 == zone_tool.kind() {
            SELECTED_BORDER_COLOUR
        } else {
            IDLE_BORDER_COLOUR
        });
    }
    if let Ok(mut text) = labels.single_mut() {
        let label = interaction_label(zone_tool.interaction());
        if text.0 != label {
            *text = Text::new(label);
        }
    }
}

pub fn apply_zone_panel_layout(
    state: Res<ZonePanelState>,
    mut roots: Query<&mut Node, With<ZonePanelRoot>>,
    mut fonts: Query<&mut TextFont, With<ZonePanelText>>,
) {
    if !state.is_changed() {
        return;
    }

    if let Ok(mut node) = roots.single_mut() {
        node.width = Val::Px(state.width());
    }
    for mut font in &mut fonts {
        font.font_size = state.font_size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_viewport_switches_to_compact() {
        let mut state = ZonePanelState::default();
        state.on_resize(Vec2::new(640.0, 480.0));
        assert!(state.compact);
        assert_eq!(state.width(), state.compact_width);

        state.on_resize(Vec2::new(1280.0, 720.0));
        assert!(!state.compact);
        assert_eq!(state.width(), state.open_width);
    }
}
