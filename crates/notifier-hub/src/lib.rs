//! # Notifier Hub
//!
//! The in-process broker between the ingest pipeline and live subscribers.
//!
//! ```text
//! ┌──────────────┐   broadcast    ┌──────────────┐  push   ┌─────────────┐
//! │ Ingest       │ ─────────────→ │     Hub      │ ──────→ │ Dispatcher  │──→ socket
//! │ (producer)   │                │ (owner task) │         │ (per-subscr)│
//! └──────────────┘                └──────────────┘  push   ├─────────────┤
//!                                   mapper+filter  ──────→ │ Dispatcher  │──→ socket
//!                                                          └─────────────┘
//! ```
//!
//! A single owner task serializes every mutation of the dispatcher registry
//! and the subscription mapper, so register/unregister/broadcast interleave
//! in one linear order and no lock sits on the hot path. Slow subscribers are
//! disconnected, never waited on.

pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod hub;
pub mod mapper;

pub use dispatcher::{Dispatcher, DispatcherState, DispatcherTransport, OutboundFrame};
pub use error::{HubError, PushError, TransportError};
pub use hub::{Hub, HubConfig, HubHandle, HubLifecycle};
pub use mapper::SubscriptionMapper;

/// Outbound queue capacity per dispatcher, in batches.
pub const DEFAULT_DISPATCHER_QUEUE_CAPACITY: usize = 256;

/// How long a dispatcher gets to drain and close during hub shutdown.
pub const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 5;
