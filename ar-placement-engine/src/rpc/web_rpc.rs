use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ar::{
    ArCommand, ArLog, ArLogEvent, ArModeController, ArPlacementSet, HitTestHandle, HudControl,
    HudControlActivated, Pose,
};

use super::webxr_bridge::{PoseParams, RayParams, WebXrBridge};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Outgoing traffic to the host page, flushed once per frame.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the postMessage JSON-RPC layer.
///
/// Incoming calls are applied before [`ArPlacementSet`] so commands take
/// effect the same frame; log lines and bridge notifications produced by the
/// placement core are flushed after it.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(ArPlacementSet),
            )
            .add_systems(
                Update,
                (forward_ar_log, flush_bridge_outbox, send_outgoing_messages)
                    .chain()
                    .after(ArPlacementSet),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let registered = window().map(|window| {
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    });
    match registered {
        Some(Ok(())) => {}
        Some(Err(e)) => error!("Failed to register message listener: {:?}", e),
        None => error!("Window object not available"),
    }

    // Hand ownership of the closure to JS
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Messages queued by the JS listener between frames.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
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

/// Everything a request handler may touch.
struct RpcContext<'a, 'w, 'h> {
    commands: &'a mut EventWriter<'w, ArCommand>,
    hud_events: &'a mut EventWriter<'h, HudControlActivated>,
    controller: &'a ArModeController,
    bridge: Option<&'a WebXrBridge>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut commands: EventWriter<ArCommand>,
    mut hud_events: EventWriter<HudControlActivated>,
    controller: Res<ArModeController>,
    bridge: Option<Res<WebXrBridge>>,
) {
    let mut context = RpcContext {
        commands: &mut commands,
        hud_events: &mut hud_events,
        controller: &controller,
        bridge: bridge.as_deref(),
    };

    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut context) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => warn!("Dropping malformed RPC message: {}", parse_error),
        }
    }
}

/// Dispatch one request. Requests without an id are notifications and get
/// no response, but are still applied.
fn handle_rpc_request(request: &RpcRequest, context: &mut RpcContext) -> Option<RpcResponse> {
    let params = &request.params;
    let result = match request.method.as_str() {
        // Frontend controls
        "enter_ar" => send_command(context, ArCommand::EnterAr),
        "exit_ar" => send_command(context, ArCommand::ExitAr),
        "toggle_placement" => send_command(context, ArCommand::TogglePlacement),
        "clear_scene" => send_command(context, ArCommand::ClearScene),
        "hud_activate" => handle_hud_activate(params, context),
        "get_placed_instances" => handle_get_placed_instances(context.controller),
        "get_surface_state" => handle_get_surface_state(context.controller),
        // WebXR bridge calls
        "hit_test_source_ready" => handle_source_ready(params, context.bridge),
        "hit_test_source_failed" => handle_source_failed(params, context.bridge),
        "hit_test_result" => handle_hit_test_result(params, context.bridge),
        "viewer_pose" => handle_viewer_pose(params, context.bridge),
        "select" => handle_select(params, context.bridge),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return request.id.clone().map(|id| {
                create_error_response(
                    id,
                    -32601,
                    "Method not found",
                    Some(json!({"method": request.method})),
                )
            });
        }
    };

    let Some(id) = request.id.clone() else {
        if let Err(error) = result {
            warn!("RPC notification {} failed: {}", request.method, error.message);
        }
        return None;
    };

    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn send_command(context: &mut RpcContext, command: ArCommand) -> Result<Value, RpcError> {
    context.commands.write(command);
    info!("AR command dispatched: {:?}", command);
    Ok(json!({ "accepted": true }))
}

fn handle_hud_activate(params: &Value, context: &mut RpcContext) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct HudParams {
        control: String,
    }

    let hud_params = parse_params::<HudParams>(params, "Expected 'control' parameter")?;
    let control = HudControl::from_string(&hud_params.control).ok_or_else(|| {
        RpcError::invalid_params(&format!("Unknown HUD control: {}", hud_params.control))
    })?;

    if !context.controller.is_ar_active() {
        return Err(RpcError::invalid_request("HUD controls are only available in AR"));
    }

    context.hud_events.write(HudControlActivated { control });
    Ok(json!({ "accepted": true, "control": hud_params.control }))
}

fn pose_json(pose: &Pose) -> Value {
    json!({
        "position": pose.position().to_array(),
        "orientation": pose.orientation().to_array(),
    })
}

fn handle_get_placed_instances(controller: &ArModeController) -> Result<Value, RpcError> {
    let instances: Vec<Value> = controller
        .registry()
        .list()
        .iter()
        .map(|instance| {
            let mut entry = pose_json(&instance.pose());
            entry["id"] = json!(instance.id().as_str());
            entry
        })
        .collect();

    Ok(json!({ "instances": instances }))
}

fn handle_get_surface_state(controller: &ArModeController) -> Result<Value, RpcError> {
    let surface = controller.surface();
    Ok(json!({
        "ar_active": controller.is_ar_active(),
        "placement_enabled": controller.placement_enabled(),
        "detected": surface.is_some_and(|s| s.detected),
        "first_detection_fired": surface.is_some_and(|s| s.first_detection_fired),
        "pose": surface.and_then(|s| s.pose).map(|pose| pose_json(&pose)),
    }))
}

fn require_bridge(bridge: Option<&WebXrBridge>) -> Result<&WebXrBridge, RpcError> {
    bridge.ok_or_else(|| RpcError::invalid_request("No WebXR bridge installed"))
}

fn handle_source_ready(params: &Value, bridge: Option<&WebXrBridge>) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct ReadyParams {
        request: u64,
        handle: u64,
    }

    let ready = parse_params::<ReadyParams>(params, "Expected 'request' and 'handle'")?;
    require_bridge(bridge)?
        .source_ready(ready.request, HitTestHandle(ready.handle))
        .map_err(|e| RpcError::invalid_params(&e.to_string()))?;
    Ok(json!({ "success": true }))
}

fn handle_source_failed(params: &Value, bridge: Option<&WebXrBridge>) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct FailedParams {
        request: u64,
        #[serde(default)]
        message: String,
    }

    let failed = parse_params::<FailedParams>(params, "Expected 'request' parameter")?;
    require_bridge(bridge)?
        .source_failed(failed.request, &failed.message)
        .map_err(|e| RpcError::invalid_params(&e.to_string()))?;
    Ok(json!({ "success": true }))
}

fn handle_hit_test_result(params: &Value, bridge: Option<&WebXrBridge>) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct ResultParams {
        handle: u64,
        pose: Option<PoseParams>,
    }

    let hit = parse_params::<ResultParams>(params, "Expected 'handle' and 'pose'")?;
    let accepted = require_bridge(bridge)?
        .hit_test_result(HitTestHandle(hit.handle), hit.pose.map(PoseParams::to_pose))
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({ "accepted": accepted }))
}

fn handle_viewer_pose(params: &Value, bridge: Option<&WebXrBridge>) -> Result<Value, RpcError> {
    #[derive(Deserialize)]
    struct ViewerParams {
        pose: PoseParams,
    }

    let viewer = parse_params::<ViewerParams>(params, "Expected 'pose' parameter")?;
    require_bridge(bridge)?
        .viewer_pose(viewer.pose.to_pose())
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({ "success": true }))
}

fn handle_select(params: &Value, bridge: Option<&WebXrBridge>) -> Result<Value, RpcError> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct SelectParams {
        ray: Option<RayParams>,
    }

    let select = if params.is_null() {
        SelectParams::default()
    } else {
        parse_params::<SelectParams>(params, "Expected optional 'ray' parameter")?
    };
    let accepted = require_bridge(bridge)?
        .select(select.ray.and_then(RayParams::to_ray))
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({ "accepted": accepted }))
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: &Value, hint: &str) -> Result<T, RpcError> {
    serde_json::from_value::<T>(params.clone()).map_err(|_| RpcError::invalid_params(hint))
}

/// Mirror every sink event to the page as an `ar_log` notification.
fn forward_ar_log(mut log: ResMut<ArLog>, mut rpc_interface: ResMut<WebRpcInterface>) {
    for event in log.take_pending() {
        let level = match event {
            ArLogEvent::HitTestError(_) | ArLogEvent::PlacementFailed(_) => "error",
            _ => "info",
        };
        rpc_interface.send_notification(
            "ar_log",
            json!({ "message": event.to_string(), "level": level }),
        );
    }
}

fn flush_bridge_outbox(
    bridge: Option<Res<WebXrBridge>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let Some(bridge) = bridge else {
        return;
    };
    for (method, params) in bridge.take_outbox() {
        rpc_interface.send_notification(method, params);
    }
}

fn create_error_response(id: Value, code: i32, message: &str, data: Option<Value>) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Responses after notifications so log lines arrive first
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

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
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_request(message: &str) -> Self {
        Self {
            code: -32600,
            message: message.to_string(),
            data: None,
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
