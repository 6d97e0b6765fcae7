//! # Event Dispatcher
//!
//! The runtime representation of one live subscriber socket: a bounded
//! outbound queue written by the hub, and a delivery task that serializes
//! frames and writes them through the transport.
//!
//! Backpressure is expressed by disconnection. `push_*` never blocks; a full
//! queue flips the dispatcher to `CLOSING` and the hub unregisters it. A
//! transport write error does the same from the delivery side, signalled
//! through the hub's unregister channel (the only hub-ward reference a
//! dispatcher holds).

use crate::error::{PushError, TransportError};
use async_trait::async_trait;
use notifier_data::{DispatcherId, Event, FinalizedBlock, RevertBlock, WireEvent};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// A tagged entry on the outbound queue.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    /// Events matched for this subscriber from one block batch.
    Events(Vec<Event>),
    /// A revert signal.
    Revert(RevertBlock),
    /// A finality signal.
    Finalized(FinalizedBlock),
}

impl OutboundFrame {
    fn to_wire(&self) -> Result<WireEvent, serde_json::Error> {
        match self {
            OutboundFrame::Events(events) => WireEvent::block_events(events),
            OutboundFrame::Revert(event) => WireEvent::revert_event(event),
            OutboundFrame::Finalized(event) => WireEvent::finalized_event(event),
        }
    }
}

/// The duplex half a dispatcher writes subscriber frames to.
///
/// Implementations wrap a concrete socket (e.g. a websocket sink). Writes
/// are awaited one at a time per dispatcher.
#[async_trait]
pub trait DispatcherTransport: Send {
    /// Write one serialized frame.
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Close the underlying connection. Must be safe to call after a failed
    /// write.
    async fn close(&mut self);
}

/// Dispatcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Waiting for work.
    Idle = 0,
    /// A frame write is in flight.
    Sending = 1,
    /// Disconnecting; no further frames are delivered.
    Closing = 2,
    /// Delivery task finished, transport closed.
    Closed = 3,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DispatcherState::Idle,
            1 => DispatcherState::Sending,
            2 => DispatcherState::Closing,
            _ => DispatcherState::Closed,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: DispatcherState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> DispatcherState {
        DispatcherState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: DispatcherState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Hub-side record of one subscriber endpoint.
///
/// Owned by the hub's registry. Dropping it (or calling [`close`]) stops the
/// delivery task after the in-flight send; queued frames are discarded.
///
/// [`close`]: Dispatcher::close
#[derive(Debug)]
pub struct Dispatcher {
    id: DispatcherId,
    frames: mpsc::Sender<OutboundFrame>,
    state: Arc<StateCell>,
    shutdown: watch::Sender<bool>,
    delivery: JoinHandle<()>,
}

impl Dispatcher {
    /// Spawn the delivery task for one subscriber.
    ///
    /// `unregister` is the hub's unregister channel; the delivery task sends
    /// its own id there when the transport dies.
    pub fn spawn(
        id: DispatcherId,
        queue_capacity: usize,
        transport: Box<dyn DispatcherTransport>,
        unregister: mpsc::UnboundedSender<DispatcherId>,
    ) -> Self {
        let (frames_tx, frames_rx) = mpsc::channel(queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(StateCell::new(DispatcherState::Idle));

        let delivery = tokio::spawn(delivery_loop(
            id,
            frames_rx,
            transport,
            shutdown_rx,
            Arc::clone(&state),
            unregister,
        ));

        Self {
            id,
            frames: frames_tx,
            state,
            shutdown: shutdown_tx,
            delivery,
        }
    }

    /// Stable identity assigned at construction.
    #[must_use]
    pub fn id(&self) -> DispatcherId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DispatcherState {
        self.state.load()
    }

    /// Queue a batch of matched events. Non-blocking.
    pub fn push_events(&self, events: Vec<Event>) -> Result<(), PushError> {
        self.push(OutboundFrame::Events(events))
    }

    /// Queue a revert signal. Non-blocking.
    pub fn push_revert(&self, event: RevertBlock) -> Result<(), PushError> {
        self.push(OutboundFrame::Revert(event))
    }

    /// Queue a finality signal. Non-blocking.
    pub fn push_finalized(&self, event: FinalizedBlock) -> Result<(), PushError> {
        self.push(OutboundFrame::Finalized(event))
    }

    fn push(&self, frame: OutboundFrame) -> Result<(), PushError> {
        match self.state.load() {
            DispatcherState::Closing | DispatcherState::Closed => return Ok(()),
            DispatcherState::Idle | DispatcherState::Sending => {}
        }

        match self.frames.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.state.store(DispatcherState::Closing);
                Err(PushError::QueueFull {
                    dispatcher_id: self.id,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Delivery already ended (transport death); the unregister
                // signal is on its way. Drop the frame.
                debug!(dispatcher_id = %self.id, "push after delivery ended, frame dropped");
                Ok(())
            }
        }
    }

    /// Begin disconnecting. Idempotent: the delivery task finishes the
    /// in-flight send, discards the rest of the queue and closes the
    /// transport.
    pub fn close(&self) {
        if self.state.load() != DispatcherState::Closed {
            self.state.store(DispatcherState::Closing);
        }
        let _ = self.shutdown.send(true);
    }

    /// Wait for the delivery task to finish. Used by hub shutdown, bounded
    /// by the configured close timeout.
    pub async fn join(self) {
        let _ = self.delivery.await;
    }
}

async fn delivery_loop(
    id: DispatcherId,
    mut frames: mpsc::Receiver<OutboundFrame>,
    mut transport: Box<dyn DispatcherTransport>,
    mut shutdown: watch::Receiver<bool>,
    state: Arc<StateCell>,
    unregister: mpsc::UnboundedSender<DispatcherId>,
) {
    loop {
        tokio::select! {
            // Fires on close() and when the hub-side record is dropped.
            _ = shutdown.changed() => break,
            frame = frames.recv() => {
                let Some(frame) = frame else { break };

                let wire = match frame.to_wire() {
                    Ok(wire) => wire,
                    Err(err) => {
                        error!(dispatcher_id = %id, error = %err, "frame serialization failed");
                        continue;
                    }
                };
                let bytes = match serde_json::to_vec(&wire) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!(dispatcher_id = %id, error = %err, "frame serialization failed");
                        continue;
                    }
                };

                state.store(DispatcherState::Sending);
                if let Err(err) = transport.send_frame(&bytes).await {
                    warn!(dispatcher_id = %id, error = %err, "transport write failed, disconnecting");
                    state.store(DispatcherState::Closing);
                    let _ = unregister.send(id);
                    break;
                }
                if state.load() == DispatcherState::Sending {
                    state.store(DispatcherState::Idle);
                }
            }
        }
    }

    transport.close().await;
    state.store(DispatcherState::Closed);
    debug!(dispatcher_id = %id, "dispatcher closed");
}
