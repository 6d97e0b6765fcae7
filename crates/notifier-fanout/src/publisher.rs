//! # Fanout Publisher
//!
//! One owner task drains the three broadcast streams and publishes each
//! message to its configured exchange. An empty exchange name disables that
//! stream. The inbound channels are the buffer; the publish itself is
//! blocking relative to the broker client.

use crate::error::PublishError;
use crate::ports::ExchangeClient;
use notifier_data::{BlockEvents, FinalizedBlock, RevertBlock};
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

const EMPTY_ROUTING_KEY: &str = "";

/// Exchange names per broadcast stream; empty disables the stream.
#[derive(Debug, Clone, Default)]
pub struct ExchangesConfig {
    /// Exchange for block event batches.
    pub events_exchange: String,
    /// Exchange for revert signals.
    pub revert_events_exchange: String,
    /// Exchange for finality signals.
    pub finalized_events_exchange: String,
}

/// Publisher lifecycle, observable from the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PublisherLifecycle {
    /// Created, owner task not yet running.
    New = 0,
    /// Owner task is draining the streams.
    Running = 1,
    /// Shutdown observed; inbound sends are rejected.
    Stopping = 2,
    /// Owner task returned.
    Stopped = 3,
}

impl PublisherLifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PublisherLifecycle::New,
            1 => PublisherLifecycle::Running,
            2 => PublisherLifecycle::Stopping,
            _ => PublisherLifecycle::Stopped,
        }
    }
}

#[derive(Debug)]
struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    fn new() -> Self {
        Self(AtomicU8::new(PublisherLifecycle::New as u8))
    }

    fn load(&self) -> PublisherLifecycle {
        PublisherLifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, lifecycle: PublisherLifecycle) {
        self.0.store(lifecycle as u8, Ordering::Release);
    }
}

/// Cloneable producer-side handle to a [`Publisher`].
#[derive(Debug, Clone)]
pub struct PublisherHandle {
    broadcast_tx: mpsc::UnboundedSender<BlockEvents>,
    revert_tx: mpsc::UnboundedSender<RevertBlock>,
    finalized_tx: mpsc::UnboundedSender<FinalizedBlock>,
    shutdown_tx: watch::Sender<bool>,
    lifecycle: Arc<LifecycleCell>,
}

impl PublisherHandle {
    /// Queue a block batch for the events exchange.
    pub fn broadcast(&self, events: BlockEvents) -> Result<(), PublishError> {
        self.ensure_accepting()?;
        self.broadcast_tx
            .send(events)
            .map_err(|_| PublishError::Stopped)
    }

    /// Queue a revert signal for the revert exchange.
    pub fn broadcast_revert(&self, event: RevertBlock) -> Result<(), PublishError> {
        self.ensure_accepting()?;
        self.revert_tx
            .send(event)
            .map_err(|_| PublishError::Stopped)
    }

    /// Queue a finality signal for the finalized exchange.
    pub fn broadcast_finalized(&self, event: FinalizedBlock) -> Result<(), PublishError> {
        self.ensure_accepting()?;
        self.finalized_tx
            .send(event)
            .map_err(|_| PublishError::Stopped)
    }

    /// Signal shutdown; queued messages are discarded.
    pub fn shutdown(&self) {
        self.lifecycle.store(PublisherLifecycle::Stopping);
        let _ = self.shutdown_tx.send(true);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> PublisherLifecycle {
        self.lifecycle.load()
    }

    fn ensure_accepting(&self) -> Result<(), PublishError> {
        match self.lifecycle.load() {
            PublisherLifecycle::New | PublisherLifecycle::Running => Ok(()),
            PublisherLifecycle::Stopping | PublisherLifecycle::Stopped => {
                Err(PublishError::Stopped)
            }
        }
    }
}

/// The fanout actor. Consumed by [`run`](Publisher::run).
pub struct Publisher {
    client: Arc<dyn ExchangeClient>,
    config: ExchangesConfig,
    broadcast_rx: mpsc::UnboundedReceiver<BlockEvents>,
    revert_rx: mpsc::UnboundedReceiver<RevertBlock>,
    finalized_rx: mpsc::UnboundedReceiver<FinalizedBlock>,
    shutdown_rx: watch::Receiver<bool>,
    lifecycle: Arc<LifecycleCell>,
}

impl Publisher {
    /// Create a publisher and its producer handle.
    pub fn new(client: Arc<dyn ExchangeClient>, config: ExchangesConfig) -> (Self, PublisherHandle) {
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
        let (revert_tx, revert_rx) = mpsc::unbounded_channel();
        let (finalized_tx, finalized_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let lifecycle = Arc::new(LifecycleCell::new());

        let publisher = Self {
            client,
            config,
            broadcast_rx,
            revert_rx,
            finalized_rx,
            shutdown_rx,
            lifecycle: Arc::clone(&lifecycle),
        };
        let handle = PublisherHandle {
            broadcast_tx,
            revert_tx,
            finalized_tx,
            shutdown_tx,
            lifecycle,
        };
        (publisher, handle)
    }

    /// The owner task body. Runs until shutdown is signalled or every handle
    /// is dropped.
    pub async fn run(mut self) {
        self.lifecycle.store(PublisherLifecycle::Running);
        info!("fanout publisher started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                Some(events) = self.broadcast_rx.recv() => self.publish_block_events(events).await,
                Some(event) = self.revert_rx.recv() => self.publish_revert(event).await,
                Some(event) = self.finalized_rx.recv() => self.publish_finalized(event).await,
            }
        }

        self.lifecycle.store(PublisherLifecycle::Stopped);
        info!("fanout publisher stopped");
    }

    async fn publish_block_events(&self, events: BlockEvents) {
        self.publish_json(&self.config.events_exchange, &events, "block events")
            .await;
    }

    async fn publish_revert(&self, event: RevertBlock) {
        self.publish_json(&self.config.revert_events_exchange, &event, "revert event")
            .await;
    }

    async fn publish_finalized(&self, event: FinalizedBlock) {
        self.publish_json(
            &self.config.finalized_events_exchange,
            &event,
            "finalized event",
        )
        .await;
    }

    /// Serialize and publish one message; failures are logged and dropped.
    async fn publish_json<T: Serialize>(&self, exchange: &str, message: &T, stream: &str) {
        if exchange.is_empty() {
            debug!(stream, "stream disabled, message dropped");
            return;
        }

        let body = match serde_json::to_vec(message) {
            Ok(body) => body,
            Err(err) => {
                error!(stream, error = %err, "could not serialize message");
                return;
            }
        };

        if let Err(err) = self
            .client
            .publish(exchange, EMPTY_ROUTING_KEY, true, false, body)
            .await
        {
            error!(stream, exchange, error = %err, "failed to publish to exchange");
        }
    }
}
