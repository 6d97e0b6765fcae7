//! # Notifier Data Crate
//!
//! Domain events and wire shapes shared by every notifier component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-crate event shapes live here.
//! - **Immutability**: an [`Event`] is never mutated after decode; components
//!   clone or move batches, they do not edit them.
//! - **Canonical rendering**: opaque byte fields serialize as base64 strings
//!   so every egress surface (subscriber sockets, fanout exchanges) emits the
//!   same JSON.

pub mod events;
pub mod subscribe;
pub mod wire;

pub use events::{
    BlockEvents, Event, FinalizedBlock, InvalidEventError, RevertBlock, MAX_EVENT_TOPICS,
    MAX_TOPIC_BYTES,
};
pub use subscribe::{DispatcherId, EventType, SubscribeEvent, SubscribePayload, Subscription, SubscriptionEntry};
pub use wire::{WireEvent, WireEventKind};
