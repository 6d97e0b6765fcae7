//! # Notifier Runtime
//!
//! The wiring surface an embedding process consumes: configuration types
//! with validation, gateway adapters over the two egress actors, and the
//! factory that assembles an ingest-to-egress pipeline from a config.
//!
//! Startup errors returned here are fatal by design; the embedding process
//! maps them to a non-zero exit.

pub mod adapters;
pub mod config;
pub mod factory;

pub use adapters::{DisabledGateway, FanoutGateway, HubGateway};
pub use config::{
    ApiType, ConfigError, ConnectorType, HubSettings, NotifierConfig, RabbitMqConfig,
    WebSocketConfig, WebSocketMode,
};
pub use factory::{create_egress, create_payload_handler, EventsEgress};
