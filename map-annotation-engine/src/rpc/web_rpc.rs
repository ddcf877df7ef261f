use crate::engine::assets::robot_model::RobotModel;
use crate::engine::map::persistence::SaveMapEvent;
use crate::tools::pointer::{PointerEvent, PointerKind};
use crate::tools::records::{ZoneKind, ZoneStyle};
use crate::tools::tool_manager::{
    ClearToolEvent, ToolAction, ToolActionEvent, ToolManager, ToolSelectionEvent,
    ToolSelectionSource, ToolType, ZoneInteractionEvent, ZoneStyleEvent,
};
use crate::tools::zone::tool::ZoneInteraction;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure. Requests without an id are notifications.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the host shell
/// and Bevy. Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host shell without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Notifications queued since the last send.
    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    /// Queue response for transmission to the host shell.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    match window() {
        Some(window) => {
            if let Err(e) = window
                .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            {
                error!("Failed to register message listener: {:?}", e);
            }
        }
        None => error!("Window object not available, RPC listener not registered"),
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the host shell.
#[derive(Event)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// A parsed, validated RPC call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCommand {
    SelectTool(ToolType),
    ClearTool,
    ToolAction(ToolAction),
    ZoneStyle {
        kind: ZoneKind,
        style: Option<ZoneStyle>,
    },
    ZoneInteraction(ZoneInteraction),
    Pointer(PointerEvent),
    SensorCloud(Vec<Vec3>),
    SaveMap,
    GetActiveTool,
}

fn parse_params<'de, T: Deserialize<'de>>(
    params: &'de serde_json::Value,
    expected: &str,
) -> Result<T, RpcError> {
    T::deserialize(params).map_err(|e| {
        debug!("Rejected RPC params {}: {}", params, e);
        RpcError::invalid_params(expected)
    })
}

/// Validate a method call and its params.
pub fn parse_command(method: &str, params: &serde_json::Value) -> Result<RpcCommand, RpcError> {
    match method {
        "tool_selection" => {
            #[derive(Deserialize)]
            struct ToolSelectionParams {
                tool: String,
            }

            let tool_params: ToolSelectionParams =
                parse_params(params, "Expected 'tool' parameter")?;
            let tool_type = ToolType::from_string(&tool_params.tool).ok_or_else(|| {
                RpcError::invalid_params(&format!("Unknown tool: {}", tool_params.tool))
            })?;
            Ok(RpcCommand::SelectTool(tool_type))
        }
        "clear_tool" => Ok(RpcCommand::ClearTool),
        "tool_action" => {
            #[derive(Deserialize)]
            struct ToolActionParams {
                action: String,
            }

            let action_params: ToolActionParams =
                parse_params(params, "Expected 'action' parameter")?;
            let action = ToolAction::from_string(&action_params.action).ok_or_else(|| {
                RpcError::invalid_params(&format!("Unknown action: {}", action_params.action))
            })?;
            Ok(RpcCommand::ToolAction(action))
        }
        "set_zone_style" => {
            #[derive(Deserialize)]
            struct ZoneStyleParams {
                kind: ZoneKind,
                #[serde(default)]
                style: Option<ZoneStyle>,
            }

            let style_params: ZoneStyleParams = parse_params(
                params,
                "Expected 'kind' (preferred | forbidden | critical) and optional 'style'",
            )?;
            if let Some(style) = &style_params.style {
                style
                    .validate()
                    .map_err(|e| RpcError::invalid_params(&e.to_string()))?;
            }
            Ok(RpcCommand::ZoneStyle {
                kind: style_params.kind,
                style: style_params.style,
            })
        }
        "set_zone_interaction" => {
            #[derive(Deserialize)]
            struct ZoneInteractionParams {
                interaction: ZoneInteraction,
            }

            let interaction_params: ZoneInteractionParams =
                parse_params(params, "Expected 'interaction' (create | select)")?;
            Ok(RpcCommand::ZoneInteraction(interaction_params.interaction))
        }
        "pointer_event" => {
            #[derive(Deserialize)]
            struct PointerParams {
                #[serde(rename = "type")]
                kind: PointerKind,
                #[serde(rename = "screenX")]
                screen_x: f32,
                #[serde(rename = "screenY")]
                screen_y: f32,
            }

            let pointer: PointerParams = parse_params(
                params,
                "Expected 'type' (down | move | up), 'screenX' and 'screenY'",
            )?;
            Ok(RpcCommand::Pointer(PointerEvent {
                kind: pointer.kind,
                screen: Vec2::new(pointer.screen_x, pointer.screen_y),
            }))
        }
        "set_sensor_cloud" => {
            #[derive(Deserialize)]
            struct SensorCloudParams {
                points: Vec<[f32; 3]>,
            }

            let cloud: SensorCloudParams =
                parse_params(params, "Expected 'points' as [[x, y, z], ...]")?;
            Ok(RpcCommand::SensorCloud(
                cloud.points.into_iter().map(Vec3::from_array).collect(),
            ))
        }
        "save_map" => Ok(RpcCommand::SaveMap),
        "get_active_tool" => Ok(RpcCommand::GetActiveTool),
        _ => Err(RpcError::method_not_found(method)),
    }
}

/// Event writers and state touched by RPC commands.
#[derive(SystemParam)]
pub struct RpcTargets<'w> {
    tool_selection: EventWriter<'w, ToolSelectionEvent>,
    clear_tool: EventWriter<'w, ClearToolEvent>,
    tool_action: EventWriter<'w, ToolActionEvent>,
    zone_style: EventWriter<'w, ZoneStyleEvent>,
    zone_interaction: EventWriter<'w, ZoneInteractionEvent>,
    pointer: EventWriter<'w, PointerEvent>,
    save_map: EventWriter<'w, SaveMapEvent>,
    tool_manager: Res<'w, ToolManager>,
    robot: Option<ResMut<'w, RobotModel>>,
}

impl RpcTargets<'_> {
    /// Dispatch a command, returning the result payload for requests.
    fn dispatch(&mut self, command: RpcCommand) -> Result<serde_json::Value, RpcError> {
        let source = ToolSelectionSource::Rpc;

        match command {
            RpcCommand::SelectTool(tool_type) => {
                self.tool_selection
                    .write(ToolSelectionEvent { tool_type, source });
                info!("Tool selection event dispatched: {:?}", tool_type);
                Ok(serde_json::json!({
                    "success": true,
                    "active_tool": tool_type.to_string()
                }))
            }
            RpcCommand::ClearTool => {
                self.clear_tool.write(ClearToolEvent { source });
                Ok(serde_json::json!({ "success": true }))
            }
            RpcCommand::ToolAction(action) => {
                self.tool_action.write(ToolActionEvent { action, source });
                Ok(serde_json::json!({ "success": true }))
            }
            RpcCommand::ZoneStyle { kind, style } => {
                self.zone_style.write(ZoneStyleEvent { kind, style });
                Ok(serde_json::json!({ "success": true, "kind": kind }))
            }
            RpcCommand::ZoneInteraction(interaction) => {
                self.zone_interaction
                    .write(ZoneInteractionEvent { interaction });
                Ok(serde_json::json!({ "success": true, "interaction": interaction }))
            }
            RpcCommand::Pointer(event) => {
                self.pointer.write(event);
                Ok(serde_json::json!({ "success": true }))
            }
            RpcCommand::SensorCloud(points) => {
                let Some(robot) = self.robot.as_deref_mut() else {
                    return Err(RpcError::internal_error("Robot model not loaded yet"));
                };
                let count = points.len();
                robot.set_sensor_cloud(points);
                Ok(serde_json::json!({ "success": true, "points": count }))
            }
            RpcCommand::SaveMap => {
                self.save_map.write(SaveMapEvent);
                Ok(serde_json::json!({ "success": true }))
            }
            RpcCommand::GetActiveTool => Ok(serde_json::json!({
                "active_tool": self.tool_manager.active_tool().map(|tool| tool.to_string())
            })),
        }
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut targets: RpcTargets,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut targets) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Unparseable RPC message: {}", parse_error);
            }
        }
    }
}

/// Run a request and build its response. Notifications (no id) are executed
/// but never answered.
fn handle_rpc_request(request: &RpcRequest, targets: &mut RpcTargets) -> Option<RpcResponse> {
    let result = parse_command(&request.method, &request.params)
        .and_then(|command| targets.dispatch(command));

    if let Err(error) = &result {
        warn!("RPC {} failed: {}", request.method, error.message);
    }

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => create_error_response(id, error),
    })
}

fn create_error_response(id: serde_json::Value, error: RpcError) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(error),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host shell.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to parent window (host shell).
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::floor::FloorMode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tool_selection_maps_names_to_tools() {
        assert_eq!(
            parse_command("tool_selection", &json!({ "tool": "floor_eraser" })),
            Ok(RpcCommand::SelectTool(ToolType::Floor(FloorMode::Eraser)))
        );

        let error = parse_command("tool_selection", &json!({ "tool": "lasso" })).unwrap_err();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Unknown tool: lasso");
    }

    #[test]
    fn missing_params_are_invalid() {
        for method in ["tool_selection", "tool_action", "set_zone_style", "pointer_event"] {
            let error = parse_command(method, &serde_json::Value::Null).unwrap_err();
            assert_eq!(error.code, -32602, "{method}");
        }
        assert_eq!(
            parse_command("clear_tool", &serde_json::Value::Null),
            Ok(RpcCommand::ClearTool)
        );
    }

    #[test]
    fn pointer_events_use_screen_coordinates() {
        let command = parse_command(
            "pointer_event",
            &json!({ "type": "down", "screenX": 120.5, "screenY": 64.0 }),
        );
        assert_eq!(
            command,
            Ok(RpcCommand::Pointer(PointerEvent {
                kind: PointerKind::Down,
                screen: Vec2::new(120.5, 64.0),
            }))
        );
    }

    #[test]
    fn zone_style_accepts_an_override() {
        let command = parse_command(
            "set_zone_style",
            &json!({
                "kind": "forbidden",
                "style": { "colour": [255, 0, 0, 128], "line_width": 0.1 }
            }),
        );
        assert_eq!(
            command,
            Ok(RpcCommand::ZoneStyle {
                kind: ZoneKind::Forbidden,
                style: Some(ZoneStyle {
                    colour: [255, 0, 0, 128],
                    line_width: 0.1,
                }),
            })
        );
        assert_eq!(
            parse_command("set_zone_interaction", &json!({ "interaction": "select" })),
            Ok(RpcCommand::ZoneInteraction(ZoneInteraction::Select))
        );
    }

    #[test]
    fn zone_style_rejects_non_positive_widths() {
        for line_width in [0.0, -0.5] {
            let error = parse_command(
                "set_zone_style",
                &json!({
                    "kind": "preferred",
                    "style": { "colour": [0, 255, 0, 120], "line_width": line_width }
                }),
            )
            .unwrap_err();
            assert_eq!(error.code, -32602);
            assert!(error.message.contains("line_width"));
        }
    }

    #[test]
    fn unknown_methods_are_not_found() {
        let error = parse_command("get_fps", &json!({})).unwrap_err();
        assert_eq!(error.code, -32601);
        assert_eq!(error.data, Some(json!({ "method": "get_fps" })));
    }

    #[test]
    fn requests_without_params_parse() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"clear_tool","id":3}"#).unwrap();
        assert_eq!(request.params, serde_json::Value::Null);
        assert_eq!(request.id, Some(json!(3)));
    }
}
