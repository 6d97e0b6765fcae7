//! Per-connection driver for subscriber sockets.

use crate::transport::WsTransport;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::StreamExt;
use notifier_data::{DispatcherId, SubscribeEvent, SubscribePayload};
use notifier_hub::{Dispatcher, HubHandle, DEFAULT_DISPATCHER_QUEUE_CAPACITY};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared state for the websocket route.
#[derive(Debug, Clone)]
pub struct WsState {
    /// Handle to the running hub.
    pub hub: HubHandle,
    /// Outbound queue capacity for new dispatchers.
    pub queue_capacity: usize,
}

impl WsState {
    /// State with the default dispatcher queue capacity.
    #[must_use]
    pub fn new(hub: HubHandle) -> Self {
        Self {
            hub,
            queue_capacity: DEFAULT_DISPATCHER_QUEUE_CAPACITY,
        }
    }
}

/// Axum handler for the subscriber websocket route.
pub async fn subscriber_socket(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        WsConnection::new(state.hub.clone(), state.queue_capacity).handle(socket)
    })
}

/// Drives one upgraded subscriber socket for its whole lifetime.
///
/// On attach: mint a dispatcher id, spawn the dispatcher over the write
/// half, register it with the hub. Then read control messages until the
/// socket dies, and unregister.
pub struct WsConnection {
    hub: HubHandle,
    queue_capacity: usize,
}

impl WsConnection {
    /// Bind a connection driver to a hub.
    #[must_use]
    pub fn new(hub: HubHandle, queue_capacity: usize) -> Self {
        Self {
            hub,
            queue_capacity,
        }
    }

    /// Run the connection to completion.
    pub async fn handle(self, socket: WebSocket) {
        let (sink, mut stream) = socket.split();
        let dispatcher_id = Uuid::new_v4();

        let dispatcher = Dispatcher::spawn(
            dispatcher_id,
            self.queue_capacity,
            Box::new(WsTransport::new(sink)),
            self.hub.unregister_sender(),
        );
        if self.hub.register(dispatcher).is_err() {
            warn!(dispatcher_id = %dispatcher_id, "hub is stopped, rejecting connection");
            return;
        }
        info!(dispatcher_id = %dispatcher_id, "subscriber connected");

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    self.handle_control_message(dispatcher_id, text.as_str());
                }
                Ok(Message::Binary(data)) => {
                    if let Ok(text) = std::str::from_utf8(&data) {
                        self.handle_control_message(dispatcher_id, text);
                    }
                }
                // Ping/pong are answered by the websocket stack.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    debug!(dispatcher_id = %dispatcher_id, "close frame received");
                    break;
                }
                Err(err) => {
                    warn!(dispatcher_id = %dispatcher_id, error = %err, "socket read failed");
                    break;
                }
            }
        }

        let _ = self.hub.unregister(dispatcher_id);
        info!(dispatcher_id = %dispatcher_id, "subscriber disconnected");
    }

    fn handle_control_message(&self, dispatcher_id: DispatcherId, text: &str) {
        let Some(event) = parse_subscribe(dispatcher_id, text) else {
            warn!(dispatcher_id = %dispatcher_id, "malformed subscribe message, ignored");
            return;
        };
        let _ = self.hub.subscribe(event);
    }
}

/// Parse a subscribe control message into a bound [`SubscribeEvent`].
fn parse_subscribe(dispatcher_id: DispatcherId, text: &str) -> Option<SubscribeEvent> {
    let payload: SubscribePayload = serde_json::from_str(text).ok()?;
    Some(SubscribeEvent::from_payload(dispatcher_id, payload))
}
