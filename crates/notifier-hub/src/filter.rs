//! # Event Filter
//!
//! The pure predicate deciding whether one subscription matches one event.
//! Stateless and deterministic; the hub calls it once per
//! `(subscription, event)` pair during a broadcast.

use notifier_data::{Event, EventType, Subscription};

/// Does `subscription` select `event` from the block-events stream?
///
/// Rules, in order:
/// 1. Only `ALL` and `BLOCK_EVENTS` subscriptions see per-block events.
/// 2. A configured address must equal the event's address.
/// 3. A configured identifier must equal the event's identifier.
/// 4. Every configured topic must appear somewhere in the event's topics
///    (order-insensitive, byte-exact). No configured topics match everything.
pub fn matches(subscription: &Subscription, event: &Event) -> bool {
    let entry = &subscription.entry;

    if entry.event_type != EventType::All && entry.event_type != EventType::BlockEvents {
        return false;
    }

    if let Some(address) = &entry.address {
        if address != &event.address {
            return false;
        }
    }

    if let Some(identifier) = &entry.identifier {
        if identifier != &event.identifier {
            return false;
        }
    }

    entry
        .topics
        .iter()
        .all(|wanted| event.topics.iter().any(|topic| topic == wanted.as_bytes()))
}
