//! # Notifier Configuration
//!
//! Recognized options with sane defaults and startup validation. Loading
//! (file, flags, environment) belongs to the embedding process; this module
//! only defines the shape and the rules.

use notifier_hub::{DEFAULT_CLOSE_TIMEOUT_SECS, DEFAULT_DISPATCHER_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors; all of them abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Unrecognized API type selector.
    #[error("invalid api type: {value}")]
    InvalidApiType { value: String },

    /// Unrecognized connector type selector.
    #[error("invalid connector type: {value}")]
    InvalidConnectorType { value: String },

    /// Unrecognized websocket mode.
    #[error("invalid websocket mode: {value}")]
    InvalidWebSocketMode { value: String },

    /// The rabbit-api egress needs a broker url.
    #[error("rabbitmq url is required for the rabbit-api egress")]
    MissingRabbitUrl,

    /// The ws-observer connector needs an upstream url.
    #[error("websocket url is required for the ws-observer connector")]
    MissingWebSocketUrl,

    /// The rabbit-api egress needs a broker client instance.
    #[error("an exchange client is required for the rabbit-api egress")]
    MissingExchangeClient,

    /// A zero dispatcher queue would disconnect every subscriber on the
    /// first push.
    #[error("dispatcher queue capacity must be greater than zero")]
    ZeroDispatcherQueue,
}

/// Which egress side is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiType {
    /// Websocket fan-out through the hub.
    #[default]
    #[serde(rename = "notifier")]
    Notifier,
    /// AMQP fan-out through the publisher.
    #[serde(rename = "rabbit-api")]
    RabbitApi,
}

impl FromStr for ApiType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "notifier" => Ok(ApiType::Notifier),
            "rabbit-api" => Ok(ApiType::RabbitApi),
            other => Err(ConfigError::InvalidApiType {
                value: other.to_string(),
            }),
        }
    }
}

/// Which ingest shape the upstream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectorType {
    /// REST-style push from the observer.
    #[serde(rename = "http")]
    Http,
    /// Duplex websocket host driven by the observer.
    #[default]
    #[serde(rename = "ws-observer")]
    WsObserver,
}

impl FromStr for ConnectorType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "http" => Ok(ConnectorType::Http),
            "ws-observer" => Ok(ConnectorType::WsObserver),
            other => Err(ConfigError::InvalidConnectorType {
                value: other.to_string(),
            }),
        }
    }
}

/// Whether the upstream websocket endpoint listens or dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebSocketMode {
    /// This process listens; the observer connects.
    #[default]
    Server,
    /// This process dials the observer.
    Client,
}

impl FromStr for WebSocketMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "server" => Ok(WebSocketMode::Server),
            "client" => Ok(WebSocketMode::Client),
            other => Err(ConfigError::InvalidWebSocketMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Upstream ingest websocket options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebSocketConfig {
    /// Listen or dial address.
    pub url: String,
    /// Listen vs dial.
    pub mode: WebSocketMode,
    /// Acknowledge each frame back to the observer.
    pub with_acknowledge: bool,
    /// Reconnect/retry cadence, seconds.
    pub retry_duration_in_sec: u64,
    /// Hold the acknowledge on processing errors.
    pub blocking_ack_on_error: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: "localhost:22111".to_string(),
            mode: WebSocketMode::Server,
            with_acknowledge: true,
            retry_duration_in_sec: 5,
            blocking_ack_on_error: false,
        }
    }
}

/// Fanout broker options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RabbitMqConfig {
    /// Broker url.
    pub url: String,
    /// Exchange for block event batches; empty disables the stream.
    pub events_exchange: String,
    /// Exchange for revert signals; empty disables the stream.
    pub revert_events_exchange: String,
    /// Exchange for finality signals; empty disables the stream.
    pub finalized_events_exchange: String,
}

/// Hub tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HubSettings {
    /// Outbound queue capacity per dispatcher, in batches.
    pub dispatcher_queue_capacity: usize,
    /// Per-dispatcher close timeout at shutdown, seconds.
    pub dispatcher_close_timeout_in_sec: u64,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            dispatcher_queue_capacity: DEFAULT_DISPATCHER_QUEUE_CAPACITY,
            dispatcher_close_timeout_in_sec: DEFAULT_CLOSE_TIMEOUT_SECS,
        }
    }
}

/// Complete notifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifierConfig {
    /// Active egress side.
    pub api_type: ApiType,
    /// Upstream ingest shape.
    pub connector_type: ConnectorType,
    /// Upstream websocket options.
    pub websocket: WebSocketConfig,
    /// Fanout broker options.
    #[serde(rename = "rabbitMQ")]
    pub rabbit_mq: RabbitMqConfig,
    /// Hub tuning.
    pub hub: HubSettings,
}

impl NotifierConfig {
    /// Check cross-field rules. Every violation is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.dispatcher_queue_capacity == 0 {
            return Err(ConfigError::ZeroDispatcherQueue);
        }
        if self.api_type == ApiType::RabbitApi && self.rabbit_mq.url.is_empty() {
            return Err(ConfigError::MissingRabbitUrl);
        }
        if self.connector_type == ConnectorType::WsObserver && self.websocket.url.is_empty() {
            return Err(ConfigError::MissingWebSocketUrl);
        }
        Ok(())
    }
}
