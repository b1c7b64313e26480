use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::core::app_state::AppState;
use crate::tools::room_outline::{EditorActionEvent, PolygonClosedEvent};
use crate::viewer::regions::{CameraToViewpointEvent, RoomUnselectEvent, ToggleRegionEvent};
use crate::viewer::room::{parse_rooms, PolygonPoint, RoomRecord};
use crate::viewer::room_registry::{
    RoomClickEvent, SelectionChangedEvent, SetRoomsEvent, SetSelectionEvent,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{window, MessageEvent};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
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

/// JSON-RPC error structure following the specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Resource managing bidirectional RPC communication with the frontend.
/// Handles both request-response pairs and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send a notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
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

/// Plugin establishing the RPC layer for iframe-based deployment. On native
/// builds the wire is absent and outgoing traffic lands in the debug log.
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
                    forward_core_events,
                    send_outgoing_messages,
                )
                    .chain(),
            )
            .add_systems(OnEnter(AppState::Running), notify_engine_ready);

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue bridging the JS event loop into the ECS.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            // Cheap shape check before queuing; full parsing happens ECS-side.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .expect("Failed to register message listener");
    }

    // Keep the closure alive by handing ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping the thread-safe message queue for wasm event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing an incoming RPC message from the frontend.
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

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut editor_actions: EventWriter<EditorActionEvent>,
    mut room_updates: EventWriter<SetRoomsEvent>,
    mut selections: EventWriter<SetSelectionEvent>,
    mut region_toggles: EventWriter<ToggleRegionEvent>,
    mut viewpoint_moves: EventWriter<CameraToViewpointEvent>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                if let Some(response) = handle_rpc_request(
                    &request,
                    &mut editor_actions,
                    &mut room_updates,
                    &mut selections,
                    &mut region_toggles,
                    &mut viewpoint_moves,
                ) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("undecodable RPC message: {parse_error}");
            }
        }
    }
}

/// Handle an individual RPC request, dispatching it onto the engine's event
/// surface and generating a response for requests that carry an id.
fn handle_rpc_request(
    request: &RpcRequest,
    editor_actions: &mut EventWriter<EditorActionEvent>,
    room_updates: &mut EventWriter<SetRoomsEvent>,
    selections: &mut EventWriter<SetSelectionEvent>,
    region_toggles: &mut EventWriter<ToggleRegionEvent>,
    viewpoint_moves: &mut EventWriter<CameraToViewpointEvent>,
) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "start_editing" => {
            editor_actions.write(EditorActionEvent::Start);
            Ok(serde_json::json!({ "success": true }))
        }
        "cancel_editing" => {
            editor_actions.write(EditorActionEvent::Cancel);
            Ok(serde_json::json!({ "success": true }))
        }
        "start_editing_with" => decode_points(&request.params).map(|points| {
            let count = points.len();
            editor_actions.write(EditorActionEvent::StartWith(points));
            serde_json::json!({ "success": true, "points": count })
        }),
        "set_rooms" => decode_rooms(&request.params).map(|rooms| {
            let loaded = rooms.len();
            room_updates.write(SetRoomsEvent {
                rooms: parse_rooms(&rooms),
            });
            serde_json::json!({ "success": true, "received": loaded })
        }),
        "set_selection" => decode_ids(&request.params).map(|ids| {
            selections.write(SetSelectionEvent { ids });
            serde_json::json!({ "success": true })
        }),
        "toggle_region" => decode_region_toggle(&request.params).map(|(name, visible)| {
            region_toggles.write(ToggleRegionEvent { name, visible });
            serde_json::json!({ "success": true })
        }),
        "camera_to_viewpoint" => decode_name(&request.params).map(|name| {
            viewpoint_moves.write(CameraToViewpointEvent { name });
            serde_json::json!({ "success": true })
        }),
        // Recenters only; clearing the selection stays a frontend decision.
        "reset_view" => {
            viewpoint_moves.write(CameraToViewpointEvent {
                name: "home".to_string(),
            });
            Ok(serde_json::json!({ "success": true }))
        }
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            Err(RpcError {
                code: -32601,
                message: "Method not found".to_string(),
                data: Some(serde_json::json!({ "method": request.method })),
            })
        }
    };

    // Only requests with an id get a response; notifications stay one-way.
    let id = request.id.clone()?;
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

fn decode_points(params: &serde_json::Value) -> Result<Vec<Vec3>, RpcError> {
    #[derive(Deserialize)]
    struct PointsParams {
        points: Vec<PolygonPoint>,
    }

    serde_json::from_value::<PointsParams>(params.clone())
        .map(|p| p.points.iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect())
        .map_err(|_| RpcError::invalid_params("Expected 'points' as an array of {x, y, z}"))
}

fn decode_rooms(params: &serde_json::Value) -> Result<Vec<RoomRecord>, RpcError> {
    #[derive(Deserialize)]
    struct RoomsParams {
        rooms: Vec<RoomRecord>,
    }

    serde_json::from_value::<RoomsParams>(params.clone())
        .map(|p| p.rooms)
        .map_err(|_| RpcError::invalid_params("Expected 'rooms' as an array of room records"))
}

fn decode_ids(params: &serde_json::Value) -> Result<Vec<String>, RpcError> {
    #[derive(Deserialize)]
    struct IdsParams {
        ids: Vec<String>,
    }

    serde_json::from_value::<IdsParams>(params.clone())
        .map(|p| p.ids)
        .map_err(|_| RpcError::invalid_params("Expected 'ids' as an array of strings"))
}

fn decode_region_toggle(params: &serde_json::Value) -> Result<(String, bool), RpcError> {
    #[derive(Deserialize)]
    struct ToggleParams {
        name: String,
        visible: bool,
    }

    serde_json::from_value::<ToggleParams>(params.clone())
        .map(|p| (p.name, p.visible))
        .map_err(|_| RpcError::invalid_params("Expected 'name' and 'visible'"))
}

fn decode_name(params: &serde_json::Value) -> Result<String, RpcError> {
    #[derive(Deserialize)]
    struct NameParams {
        name: String,
    }

    serde_json::from_value::<NameParams>(params.clone())
        .map(|p| p.name)
        .map_err(|_| RpcError::invalid_params("Expected 'name'"))
}

fn polygon_params(polygon: &[Vec3]) -> serde_json::Value {
    let points: Vec<serde_json::Value> = polygon
        .iter()
        .map(|p| serde_json::json!({ "x": p.x, "y": p.y, "z": p.z }))
        .collect();
    serde_json::json!({ "polygon": points })
}

/// Mirrors the engine's outward events onto the RPC wire.
fn forward_core_events(
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut polygon_closed: EventReader<PolygonClosedEvent>,
    mut room_clicks: EventReader<RoomClickEvent>,
    mut room_unselects: EventReader<RoomUnselectEvent>,
    mut selection_changes: EventReader<SelectionChangedEvent>,
) {
    for event in polygon_closed.read() {
        rpc_interface.send_notification("polygon_closed", polygon_params(&event.polygon));
    }
    for event in room_clicks.read() {
        rpc_interface.send_notification("room_click", serde_json::json!({ "id": event.id }));
    }
    for event in room_unselects.read() {
        rpc_interface.send_notification("room_unselect", serde_json::json!({ "id": event.id }));
    }
    for event in selection_changes.read() {
        rpc_interface
            .send_notification("selection_changed", serde_json::json!({ "ids": event.ids }));
    }
}

fn notify_engine_ready(mut rpc_interface: ResMut<WebRpcInterface>) {
    rpc_interface.send_notification("engine_ready", serde_json::json!({}));
}

#[cfg(target_arch = "wasm32")]
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    let Some(window) = window() else {
        return;
    };

    for notification in rpc_interface.outgoing_notifications.drain(..) {
        if let Ok(payload) = serde_json::to_string(&notification) {
            let _ = window.post_message(&JsValue::from_str(&payload), "*");
        }
    }
    for response in rpc_interface.outgoing_responses.drain(..) {
        if let Ok(payload) = serde_json::to_string(&response) {
            let _ = window.post_message(&JsValue::from_str(&payload), "*");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        debug!("rpc notification {}: {}", notification.method, notification.params);
    }
    for response in rpc_interface.outgoing_responses.drain(..) {
        debug!("rpc response: {:?}", response.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_decode_from_the_wire_format() {
        let raw = r#"{"jsonrpc":"2.0","method":"toggle_region","params":{"name":"main-floor-1","visible":false},"id":7}"#;
        let request: RpcRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(request.method, "toggle_region");
        let (name, visible) = decode_region_toggle(&request.params).unwrap();
        assert_eq!(name, "main-floor-1");
        assert!(!visible);
    }

    #[test]
    fn point_params_decode_into_model_space() {
        let params = serde_json::json!({
            "points": [
                { "x": 1.0, "y": 2.0, "z": 3.0 },
                { "x": -1.5, "y": 0.0, "z": 0.25 }
            ]
        });

        let points = decode_points(&params).unwrap();
        assert_eq!(points, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.5, 0.0, 0.25)]);
        assert!(decode_points(&serde_json::json!({ "points": "nope" })).is_err());
    }

    #[test]
    fn room_params_keep_the_encoded_polygon_for_the_registry_to_decode() {
        let params = serde_json::json!({
            "rooms": [
                { "id": "r1", "code": "A-101", "polygon": "[{\"x\":0,\"y\":0,\"z\":0},{\"x\":1,\"y\":0,\"z\":0},{\"x\":1,\"y\":0,\"z\":1}]" },
                { "id": "r2", "code": "A-102", "polygon": null }
            ]
        });

        let records = decode_rooms(&params).unwrap();
        assert_eq!(records.len(), 2);

        let rooms = parse_rooms(&records);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, "r1");
    }

    #[test]
    fn polygon_notifications_serialize_as_plain_triples() {
        let params = polygon_params(&[Vec3::new(1.0, 2.0, 3.0)]);
        assert_eq!(
            params,
            serde_json::json!({ "polygon": [{ "x": 1.0, "y": 2.0, "z": 3.0 }] })
        );
    }
}
