//! # Subscription Shapes
//!
//! Payloads a subscriber sends when attaching, and the mapper-internal
//! record the hub matches events against.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one live subscriber socket.
pub type DispatcherId = Uuid;

/// The event stream a subscription entry selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Every stream.
    #[default]
    All,
    /// Per-block event batches.
    BlockEvents,
    /// Revert signals.
    RevertEvents,
    /// Finality signals.
    FinalizedEvents,
}

/// One filter expression; an absent field is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    /// Match only events from this address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Match only events with this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Each configured topic must appear somewhere in the event's topics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    /// Stream selector; defaults to every stream.
    #[serde(default)]
    pub event_type: EventType,
}

/// Wire shape of the subscribe control message, `{"subscriptionEntries": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePayload {
    #[serde(default)]
    pub subscription_entries: Vec<SubscriptionEntry>,
}

/// A parsed subscribe request bound to the dispatcher that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeEvent {
    /// The subscriber socket this request came from.
    pub dispatcher_id: DispatcherId,
    /// Filter expressions, in the order the subscriber sent them.
    pub entries: Vec<SubscriptionEntry>,
}

impl SubscribeEvent {
    /// Bind a decoded wire payload to its dispatcher.
    pub fn from_payload(dispatcher_id: DispatcherId, payload: SubscribePayload) -> Self {
        Self {
            dispatcher_id,
            entries: payload.subscription_entries,
        }
    }
}

/// Mapper-internal record: one filter expression owned by one dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Owning dispatcher.
    pub dispatcher_id: DispatcherId,
    /// The filter expression.
    pub entry: SubscriptionEntry,
}
