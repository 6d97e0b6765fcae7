//! # Notifier Fanout
//!
//! The durable-consumer egress: an actor mirroring the hub's consumer
//! contract that serializes each broadcast stream to a named fanout exchange.
//!
//! The broker client itself is an outbound port ([`ExchangeClient`]); this
//! crate only decides what gets published where. Delivery is at-most-once:
//! publish failures are logged and dropped.

pub mod error;
pub mod ports;
pub mod publisher;

pub use error::PublishError;
pub use ports::ExchangeClient;
pub use publisher::{ExchangesConfig, Publisher, PublisherHandle, PublisherLifecycle};
