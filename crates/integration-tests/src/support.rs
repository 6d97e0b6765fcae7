//! Test doubles and builders shared by the end-to-end scenarios.

use async_trait::async_trait;
use notifier_data::WireEvent;
use notifier_fanout::{ExchangeClient, PublishError};
use notifier_hub::{Dispatcher, DispatcherTransport, HubHandle, TransportError};
use notifier_ingest::PayloadHandler;
use notifier_runtime::{create_egress, create_payload_handler, EventsEgress, NotifierConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

/// Transport that records every delivered frame, decoded.
pub struct RecordingTransport {
    frames: Arc<Mutex<Vec<WireEvent>>>,
}

#[async_trait]
impl DispatcherTransport for RecordingTransport {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames
            .lock()
            .unwrap()
            .push(serde_json::from_slice(frame).expect("frame is not wire JSON"));
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Transport whose writes never complete, simulating a stalled subscriber.
pub struct StuckTransport {
    started: Arc<Notify>,
}

#[async_trait]
impl DispatcherTransport for StuckTransport {
    async fn send_frame(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
        self.started.notify_one();
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn close(&mut self) {}
}

/// Exchange client capturing `(exchange, body)` pairs.
#[derive(Default)]
pub struct RecordingExchangeClient {
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingExchangeClient {
    /// Snapshot of everything published so far.
    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeClient for RecordingExchangeClient {
    async fn publish(
        &self,
        exchange: &str,
        _routing_key: &str,
        _mandatory: bool,
        _immediate: bool,
        body: Vec<u8>,
    ) -> Result<(), PublishError> {
        self.published.lock().unwrap().push((
            exchange.to_string(),
            serde_json::from_slice(&body).expect("body is not JSON"),
        ));
        Ok(())
    }
}

/// A subscriber attached through a recording transport.
pub struct TestSubscriber {
    pub id: Uuid,
    frames: Arc<Mutex<Vec<WireEvent>>>,
}

impl TestSubscriber {
    /// Spawn a dispatcher over a recording transport and register it.
    pub fn attach(hub: &HubHandle, queue_capacity: usize) -> Self {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::spawn(
            Uuid::new_v4(),
            queue_capacity,
            Box::new(RecordingTransport {
                frames: Arc::clone(&frames),
            }),
            hub.unregister_sender(),
        );
        let id = dispatcher.id();
        hub.register(dispatcher).expect("hub rejected registration");
        Self { id, frames }
    }

    /// Spawn a dispatcher whose transport never completes a write.
    pub fn attach_stalled(hub: &HubHandle, queue_capacity: usize) -> (Self, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let dispatcher = Dispatcher::spawn(
            Uuid::new_v4(),
            queue_capacity,
            Box::new(StuckTransport {
                started: Arc::clone(&started),
            }),
            hub.unregister_sender(),
        );
        let id = dispatcher.id();
        hub.register(dispatcher).expect("hub rejected registration");
        (
            Self {
                id,
                frames: Arc::new(Mutex::new(Vec::new())),
            },
            started,
        )
    }

    /// Frames delivered so far.
    pub fn frames(&self) -> Vec<WireEvent> {
        self.frames.lock().unwrap().clone()
    }

    /// Wait until at least `count` frames arrived.
    pub async fn wait_for_frames(&self, count: usize) -> Vec<WireEvent> {
        timeout(Duration::from_secs(2), async {
            loop {
                let frames = self.frames();
                if frames.len() >= count {
                    return frames;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("frames not delivered in time")
    }
}

/// The wired stack for the websocket egress: hub plus payload handler.
pub struct NotifierStack {
    pub egress: EventsEgress,
    pub handler: PayloadHandler,
}

impl NotifierStack {
    /// Build a hub-backed stack from the default configuration.
    pub fn hub_backed() -> Self {
        Self::hub_backed_with(&NotifierConfig::default())
    }

    /// Build a hub-backed stack from a custom configuration.
    pub fn hub_backed_with(config: &NotifierConfig) -> Self {
        let egress = create_egress(config, None).expect("factory failed");
        let handler = create_payload_handler(egress.gateway()).expect("handler build failed");
        Self { egress, handler }
    }

    /// Handle to the running hub.
    pub fn hub(&self) -> &HubHandle {
        self.egress.hub().expect("hub egress expected")
    }
}

/// Let cross-channel messages (subscribe vs broadcast) land in the owner
/// task before driving the next step.
pub async fn settle() {
    sleep(Duration::from_millis(25)).await;
}
