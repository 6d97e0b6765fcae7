//! # Notifier Ingest
//!
//! Decodes upstream frames `(bytes, topic, version)` into typed domain
//! events and hands them to the active egress through the
//! [`BroadcastGateway`] port.
//!
//! Topics are fixed by the upstream contract; versions are opaque keys into
//! a decoder registry, so producer format upgrades are a registry entry, not
//! a code path. The upstream is authoritative: a frame that fails to decode
//! is logged and dropped, and the notifier stays up.

pub mod decoder;
pub mod error;
pub mod handler;
pub mod ports;
pub mod topics;

pub use decoder::{JsonDecoderV1, PayloadDecoder, PAYLOAD_VERSION_V1};
pub use error::IngestError;
pub use handler::PayloadHandler;
pub use ports::{BroadcastGateway, GatewayClosed};
