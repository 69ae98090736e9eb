//! WebSocket echo gateway on `/ws`.
//!
//! Text frames carry `{"event": "...", "data": ...}`. A `ping` event is
//! answered with a `pong` carrying the same data; other events are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use todoapi_service_shared::{record_ws_message, AppState, RequestContext, RequestId};

/// One event frame in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WsEvent {
    pub fn pong(data: Value) -> Self {
        Self {
            event: "pong".to_string(),
            data,
        }
    }
}

/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, ctx.request_id))
}

/// Reply to a single text frame, if any.
pub fn handle_message(client_id: &RequestId, text: &str) -> Option<WsEvent> {
    let event: WsEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(client_id = %client_id, error = %e, "ignoring malformed frame");
            record_ws_message("malformed");
            return None;
        }
    };

    if event.event != "ping" {
        debug!(client_id = %client_id, event = %event.event, "ignoring unknown event");
        record_ws_message("unknown");
        return None;
    }

    info!(client_id = %client_id, "message received from client");
    debug!(client_id = %client_id, payload = %event.data, "ping payload");
    record_ws_message("ping");
    Some(WsEvent::pong(event.data))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, client_id: RequestId) {
    let clients = state.connect_client();
    info!(client_id = %client_id, "client connected");
    debug!(clients, "number of connected clients");

    while let Some(frame) = socket.recv().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "socket error");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let Some(reply) = handle_message(&client_id, text.as_str()) else {
                    continue;
                };
                let body = match serde_json::to_string(&reply) {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(client_id = %client_id, error = %e, "failed to encode reply");
                        continue;
                    }
                };
                if socket.send(Message::Text(body.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    let clients = state.disconnect_client();
    info!(client_id = %client_id, "client disconnected");
    debug!(clients, "number of connected clients");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> RequestId {
        RequestId::new("test-client-id")
    }

    #[test]
    fn test_ping_is_answered_with_same_data() {
        let reply = handle_message(&client(), r#"{"event":"ping","data":"Hello world!"}"#);
        assert_eq!(reply, Some(WsEvent::pong(json!("Hello world!"))));
    }

    #[test]
    fn test_structured_payload_round_trips() {
        let reply =
            handle_message(&client(), r#"{"event":"ping","data":{"n":[1,2]}}"#).unwrap();
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({"event": "pong", "data": {"n": [1, 2]}})
        );
    }

    #[test]
    fn test_missing_data_is_null() {
        let reply = handle_message(&client(), r#"{"event":"ping"}"#).unwrap();
        assert_eq!(reply.data, Value::Null);
    }

    #[test]
    fn test_other_events_and_garbage_are_ignored() {
        assert_eq!(handle_message(&client(), r#"{"event":"hello","data":1}"#), None);
        assert_eq!(handle_message(&client(), "not json"), None);
        assert_eq!(handle_message(&client(), r#"{"data":1}"#), None);
    }
}
