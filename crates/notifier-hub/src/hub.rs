//! # Hub
//!
//! The central broker actor. One owner task holds the dispatcher registry and
//! the subscription mapper, and multiplexes the inbound channels in a
//! non-prioritized select: the control stream (register, unregister,
//! subscribe), the dispatcher death signals, the three broadcast streams and
//! the shutdown signal.
//!
//! Producers talk to the hub through a cloneable [`HubHandle`]. Every inbound
//! stream is FIFO on its own; no ordering holds between streams. Registry
//! mutations share the control stream, so a subscribe issued after a register
//! is always processed after it.

use crate::dispatcher::Dispatcher;
use crate::error::{HubError, PushError};
use crate::filter;
use crate::mapper::SubscriptionMapper;
use crate::{DEFAULT_CLOSE_TIMEOUT_SECS, DEFAULT_DISPATCHER_QUEUE_CAPACITY};
use notifier_data::{
    BlockEvents, DispatcherId, Event, EventType, FinalizedBlock, RevertBlock, SubscribeEvent,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Hub tuning knobs.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Outbound queue capacity per dispatcher, in batches.
    pub dispatcher_queue_capacity: usize,
    /// How long each dispatcher gets to close during shutdown.
    pub dispatcher_close_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            dispatcher_queue_capacity: DEFAULT_DISPATCHER_QUEUE_CAPACITY,
            dispatcher_close_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
        }
    }
}

/// Hub lifecycle, observable from the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HubLifecycle {
    /// Created, owner task not yet running.
    New = 0,
    /// Owner task is processing messages.
    Running = 1,
    /// Shutdown observed; inbound sends are rejected.
    Stopping = 2,
    /// Owner task returned; every dispatcher is closed.
    Stopped = 3,
}

impl HubLifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => HubLifecycle::New,
            1 => HubLifecycle::Running,
            2 => HubLifecycle::Stopping,
            _ => HubLifecycle::Stopped,
        }
    }
}

#[derive(Debug)]
struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    fn new() -> Self {
        Self(AtomicU8::new(HubLifecycle::New as u8))
    }

    fn load(&self) -> HubLifecycle {
        HubLifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, lifecycle: HubLifecycle) {
        self.0.store(lifecycle as u8, Ordering::Release);
    }
}

/// Registry mutations, serialized on one FIFO channel so that a subscribe
/// sent right after a register can never overtake it.
#[derive(Debug)]
enum HubCommand {
    Register(Dispatcher),
    Unregister(DispatcherId),
    Subscribe(SubscribeEvent),
}

/// Cloneable producer-side handle to a [`Hub`].
#[derive(Debug, Clone)]
pub struct HubHandle {
    control_tx: mpsc::UnboundedSender<HubCommand>,
    death_tx: mpsc::UnboundedSender<DispatcherId>,
    broadcast_tx: mpsc::UnboundedSender<BlockEvents>,
    revert_tx: mpsc::UnboundedSender<RevertBlock>,
    finalized_tx: mpsc::UnboundedSender<FinalizedBlock>,
    shutdown_tx: watch::Sender<bool>,
    lifecycle: Arc<LifecycleCell>,
}

impl HubHandle {
    /// Hand a freshly created dispatcher to the hub. Registering an id that
    /// is already present is a no-op on the hub side.
    pub fn register(&self, dispatcher: Dispatcher) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.control_tx
            .send(HubCommand::Register(dispatcher))
            .map_err(|_| HubError::Stopped)
    }

    /// Ask the hub to drop a dispatcher: its subscriptions are removed and
    /// its socket closed.
    pub fn unregister(&self, dispatcher_id: DispatcherId) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.control_tx
            .send(HubCommand::Unregister(dispatcher_id))
            .map_err(|_| HubError::Stopped)
    }

    /// Attach filter expressions to a registered dispatcher.
    pub fn subscribe(&self, event: SubscribeEvent) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.control_tx
            .send(HubCommand::Subscribe(event))
            .map_err(|_| HubError::Stopped)
    }

    /// Fan a block batch out to every matching subscriber.
    pub fn broadcast(&self, events: BlockEvents) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.broadcast_tx
            .send(events)
            .map_err(|_| HubError::Stopped)
    }

    /// Fan a revert signal out to revert subscribers.
    pub fn broadcast_revert(&self, event: RevertBlock) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.revert_tx.send(event).map_err(|_| HubError::Stopped)
    }

    /// Fan a finality signal out to finality subscribers.
    pub fn broadcast_finalized(&self, event: FinalizedBlock) -> Result<(), HubError> {
        self.ensure_accepting()?;
        self.finalized_tx.send(event).map_err(|_| HubError::Stopped)
    }

    /// Signal shutdown. The owner task stops accepting work, closes every
    /// dispatcher (bounded per-dispatcher timeout) and then returns.
    pub fn shutdown(&self) {
        self.lifecycle.store(HubLifecycle::Stopping);
        let _ = self.shutdown_tx.send(true);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> HubLifecycle {
        self.lifecycle.load()
    }

    /// The unregister signal channel handed to dispatcher delivery tasks.
    #[must_use]
    pub fn unregister_sender(&self) -> mpsc::UnboundedSender<DispatcherId> {
        self.death_tx.clone()
    }

    fn ensure_accepting(&self) -> Result<(), HubError> {
        match self.lifecycle.load() {
            HubLifecycle::New | HubLifecycle::Running => Ok(()),
            HubLifecycle::Stopping | HubLifecycle::Stopped => Err(HubError::Stopped),
        }
    }
}

/// The broker state machine. Consumed by [`run`](Hub::run), which becomes the
/// owner task.
#[derive(Debug)]
pub struct Hub {
    config: HubConfig,
    mapper: SubscriptionMapper,
    dispatchers: HashMap<DispatcherId, Dispatcher>,
    control_rx: mpsc::UnboundedReceiver<HubCommand>,
    death_rx: mpsc::UnboundedReceiver<DispatcherId>,
    broadcast_rx: mpsc::UnboundedReceiver<BlockEvents>,
    revert_rx: mpsc::UnboundedReceiver<RevertBlock>,
    finalized_rx: mpsc::UnboundedReceiver<FinalizedBlock>,
    shutdown_rx: watch::Receiver<bool>,
    lifecycle: Arc<LifecycleCell>,
}

impl Hub {
    /// Create a hub and its producer handle.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (death_tx, death_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
        let (revert_tx, revert_rx) = mpsc::unbounded_channel();
        let (finalized_tx, finalized_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let lifecycle = Arc::new(LifecycleCell::new());

        let hub = Self {
            config,
            mapper: SubscriptionMapper::new(),
            dispatchers: HashMap::new(),
            control_rx,
            death_rx,
            broadcast_rx,
            revert_rx,
            finalized_rx,
            shutdown_rx,
            lifecycle: Arc::clone(&lifecycle),
        };
        let handle = HubHandle {
            control_tx,
            death_tx,
            broadcast_tx,
            revert_tx,
            finalized_tx,
            shutdown_tx,
            lifecycle,
        };
        (hub, handle)
    }

    /// The owner task body. Runs until shutdown is signalled (or every
    /// handle is dropped), then closes all dispatchers before returning, so
    /// transport sockets are gone by the time the task finishes.
    pub async fn run(mut self) {
        self.lifecycle.store(HubLifecycle::Running);
        info!("hub started");

        loop {
            tokio::select! {
                // Matches both the shutdown signal and every handle being
                // dropped; either way no more work can arrive.
                _ = self.shutdown_rx.changed() => break,
                Some(command) = self.control_rx.recv() => self.handle_command(command),
                Some(dispatcher_id) = self.death_rx.recv() => self.handle_unregister(dispatcher_id),
                Some(events) = self.broadcast_rx.recv() => self.handle_broadcast(events),
                Some(event) = self.revert_rx.recv() => self.handle_revert(event),
                Some(event) = self.finalized_rx.recv() => self.handle_finalized(event),
            }
        }

        self.lifecycle.store(HubLifecycle::Stopping);
        debug!("hub is stopping");
        self.shutdown_dispatchers().await;
        self.lifecycle.store(HubLifecycle::Stopped);
        info!("hub stopped");
    }

    fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(dispatcher) => self.handle_register(dispatcher),
            HubCommand::Unregister(dispatcher_id) => self.handle_unregister(dispatcher_id),
            HubCommand::Subscribe(event) => self.handle_subscribe(event),
        }
    }

    fn handle_register(&mut self, dispatcher: Dispatcher) {
        let id = dispatcher.id();
        if self.dispatchers.contains_key(&id) {
            debug!(dispatcher_id = %id, "dispatcher already registered");
            return;
        }

        self.dispatchers.insert(id, dispatcher);
        info!(dispatcher_id = %id, "registered new dispatcher");
    }

    fn handle_unregister(&mut self, dispatcher_id: DispatcherId) {
        let Some(dispatcher) = self.dispatchers.remove(&dispatcher_id) else {
            // Raced with a slow-consumer disconnect or a duplicate signal.
            debug!(dispatcher_id = %dispatcher_id, "unregister for unknown dispatcher");
            return;
        };

        self.mapper.remove_subscriptions(dispatcher_id);
        dispatcher.close();
        info!(dispatcher_id = %dispatcher_id, "unregistered dispatcher");
    }

    fn handle_subscribe(&mut self, event: SubscribeEvent) {
        if !self.dispatchers.contains_key(&event.dispatcher_id) {
            warn!(
                dispatcher_id = %event.dispatcher_id,
                "subscribe for unregistered dispatcher, dropped"
            );
            return;
        }
        self.mapper.match_subscribe_event(event);
    }

    fn handle_broadcast(&mut self, block_events: BlockEvents) {
        let subscriptions = self.mapper.subscriptions();

        // One pass over (event x subscription); upstream order is preserved
        // per dispatcher because events drive the outer loop. An event
        // matching several subscriptions of one dispatcher is appended once
        // per match.
        let mut per_dispatcher: HashMap<DispatcherId, Vec<Event>> = HashMap::new();
        for event in &block_events.events {
            for subscription in &subscriptions {
                if filter::matches(subscription, event) {
                    per_dispatcher
                        .entry(subscription.dispatcher_id)
                        .or_default()
                        .push(event.clone());
                }
            }
        }

        debug!(
            block_hash = %block_events.hash,
            events = block_events.events.len(),
            targets = per_dispatcher.len(),
            "broadcasting block events"
        );

        let mut slow = Vec::new();
        for (dispatcher_id, events) in per_dispatcher {
            // A missing dispatcher raced with unregistration; skip it.
            let Some(dispatcher) = self.dispatchers.get(&dispatcher_id) else {
                continue;
            };
            if let Err(PushError::QueueFull { .. }) = dispatcher.push_events(events) {
                slow.push(dispatcher_id);
            }
        }
        self.disconnect_slow(slow);
    }

    fn handle_revert(&mut self, event: RevertBlock) {
        let mut slow = Vec::new();
        for dispatcher_id in self.mapper.dispatchers_for_type(EventType::RevertEvents) {
            let Some(dispatcher) = self.dispatchers.get(&dispatcher_id) else {
                continue;
            };
            if let Err(PushError::QueueFull { .. }) = dispatcher.push_revert(event.clone()) {
                slow.push(dispatcher_id);
            }
        }
        self.disconnect_slow(slow);
    }

    fn handle_finalized(&mut self, event: FinalizedBlock) {
        let mut slow = Vec::new();
        for dispatcher_id in self.mapper.dispatchers_for_type(EventType::FinalizedEvents) {
            let Some(dispatcher) = self.dispatchers.get(&dispatcher_id) else {
                continue;
            };
            if let Err(PushError::QueueFull { .. }) = dispatcher.push_finalized(event.clone()) {
                slow.push(dispatcher_id);
            }
        }
        self.disconnect_slow(slow);
    }

    fn disconnect_slow(&mut self, dispatcher_ids: Vec<DispatcherId>) {
        for dispatcher_id in dispatcher_ids {
            warn!(
                dispatcher_id = %dispatcher_id,
                "outbound queue full, disconnecting slow subscriber"
            );
            self.handle_unregister(dispatcher_id);
        }
    }

    async fn shutdown_dispatchers(&mut self) {
        let close_timeout = self.config.dispatcher_close_timeout;
        for (dispatcher_id, dispatcher) in std::mem::take(&mut self.dispatchers) {
            self.mapper.remove_subscriptions(dispatcher_id);
            dispatcher.close();
            if tokio::time::timeout(close_timeout, dispatcher.join())
                .await
                .is_err()
            {
                error!(
                    dispatcher_id = %dispatcher_id,
                    "dispatcher did not close within timeout"
                );
            }
        }
    }
}
