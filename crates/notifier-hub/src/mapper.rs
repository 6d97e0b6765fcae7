//! # Subscription Mapper
//!
//! Indexes filter expressions by owning dispatcher and answers
//! "which subscriptions are live?" during a broadcast.
//!
//! The mapper is owned by the hub task: every mutation happens inside the
//! serializing loop, so it needs no interior locking. Snapshots are owned
//! copies; callers never see internal slots.

use notifier_data::{DispatcherId, EventType, SubscribeEvent, Subscription};
use std::collections::HashMap;
use tracing::debug;

/// Per-dispatcher subscription store.
#[derive(Debug, Default)]
pub struct SubscriptionMapper {
    /// Subscriptions grouped by owning dispatcher.
    by_dispatcher: HashMap<DispatcherId, Vec<Subscription>>,
    /// Flat list scanned linearly during a broadcast.
    all: Vec<Subscription>,
}

impl SubscriptionMapper {
    /// Create an empty mapper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every entry of a subscribe request under its dispatcher.
    ///
    /// Structurally duplicate entries for the same dispatcher are ignored, so
    /// re-sending the same subscribe payload is idempotent.
    pub fn match_subscribe_event(&mut self, event: SubscribeEvent) {
        let owned = self.by_dispatcher.entry(event.dispatcher_id).or_default();

        for entry in event.entries {
            if owned.iter().any(|existing| existing.entry == entry) {
                continue;
            }

            let subscription = Subscription {
                dispatcher_id: event.dispatcher_id,
                entry,
            };
            owned.push(subscription.clone());
            self.all.push(subscription);
        }

        debug!(
            dispatcher_id = %event.dispatcher_id,
            subscriptions = owned.len(),
            "matched subscribe event"
        );
    }

    /// Owned snapshot of every live subscription.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.all.clone()
    }

    /// Subscriptions owned by one dispatcher.
    #[must_use]
    pub fn subscriptions_for(&self, dispatcher_id: DispatcherId) -> Vec<Subscription> {
        self.by_dispatcher
            .get(&dispatcher_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Dispatchers holding a subscription for `event_type` or `ALL`.
    ///
    /// Each dispatcher appears once, regardless of how many of its
    /// subscriptions select the stream.
    #[must_use]
    pub fn dispatchers_for_type(&self, event_type: EventType) -> Vec<DispatcherId> {
        self.by_dispatcher
            .iter()
            .filter(|(_, subscriptions)| {
                subscriptions.iter().any(|subscription| {
                    subscription.entry.event_type == event_type
                        || subscription.entry.event_type == EventType::All
                })
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop every subscription owned by a dispatcher, from both indices.
    pub fn remove_subscriptions(&mut self, dispatcher_id: DispatcherId) {
        if self.by_dispatcher.remove(&dispatcher_id).is_some() {
            self.all
                .retain(|subscription| subscription.dispatcher_id != dispatcher_id);
            debug!(dispatcher_id = %dispatcher_id, "removed subscriptions");
        }
    }

    /// Number of live subscriptions across all dispatchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// True when no subscriptions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
