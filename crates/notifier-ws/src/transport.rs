//! Dispatcher transport over an axum websocket sink.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use notifier_hub::{DispatcherTransport, TransportError};

/// The write half of one subscriber socket.
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
}

impl WsTransport {
    /// Wrap the write half produced by splitting an upgraded socket.
    #[must_use]
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl DispatcherTransport for WsTransport {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        // Frames are serialized JSON; subscribers expect text messages.
        let text = std::str::from_utf8(frame).map_err(|err| TransportError::Write {
            reason: err.to_string(),
        })?;
        self.sink
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(|err| TransportError::Write {
                reason: err.to_string(),
            })
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}
