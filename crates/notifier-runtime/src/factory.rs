//! # Component Factory
//!
//! Assembles the configured egress actor and the payload handler feeding it.
//! Everything returned here is already running; the embedding process only
//! holds handles.

use crate::adapters::{FanoutGateway, HubGateway};
use crate::config::{ApiType, ConfigError, NotifierConfig};
use notifier_fanout::{ExchangeClient, ExchangesConfig, Publisher, PublisherHandle};
use notifier_hub::{Hub, HubConfig, HubHandle};
use notifier_ingest::{
    BroadcastGateway, IngestError, JsonDecoderV1, PayloadDecoder, PayloadHandler,
    PAYLOAD_VERSION_V1,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// The active egress side, selected by `apiType`.
#[derive(Debug)]
pub enum EventsEgress {
    /// Live websocket fan-out through the hub.
    Hub {
        handle: HubHandle,
        task: JoinHandle<()>,
    },
    /// Durable fan-out through the exchange publisher.
    Fanout {
        handle: PublisherHandle,
        task: JoinHandle<()>,
    },
}

impl EventsEgress {
    /// The ingest-facing gateway for this egress.
    #[must_use]
    pub fn gateway(&self) -> Arc<dyn BroadcastGateway> {
        match self {
            EventsEgress::Hub { handle, .. } => Arc::new(HubGateway::new(handle.clone())),
            EventsEgress::Fanout { handle, .. } => Arc::new(FanoutGateway::new(handle.clone())),
        }
    }

    /// The hub handle, when the websocket egress is active.
    #[must_use]
    pub fn hub(&self) -> Option<&HubHandle> {
        match self {
            EventsEgress::Hub { handle, .. } => Some(handle),
            EventsEgress::Fanout { .. } => None,
        }
    }

    /// Signal shutdown on whichever actor is running, without waiting.
    pub fn shutdown(&self) {
        match self {
            EventsEgress::Hub { handle, .. } => handle.shutdown(),
            EventsEgress::Fanout { handle, .. } => handle.shutdown(),
        }
    }

    /// Shut the actor down and wait for it to finish. For the hub egress,
    /// every dispatcher socket is closed by the time this returns.
    pub async fn close(self) {
        self.shutdown();
        let task = match self {
            EventsEgress::Hub { task, .. } | EventsEgress::Fanout { task, .. } => task,
        };
        let _ = task.await;
    }
}

/// Spawn the egress actor the configuration selects.
///
/// The rabbit-api egress needs a broker client; not providing one is a
/// startup error, as is an invalid configuration.
pub fn create_egress(
    config: &NotifierConfig,
    exchange_client: Option<Arc<dyn ExchangeClient>>,
) -> Result<EventsEgress, ConfigError> {
    config.validate()?;

    match config.api_type {
        ApiType::Notifier => {
            let (hub, handle) = Hub::new(HubConfig {
                dispatcher_queue_capacity: config.hub.dispatcher_queue_capacity,
                dispatcher_close_timeout: Duration::from_secs(
                    config.hub.dispatcher_close_timeout_in_sec,
                ),
            });
            let task = tokio::spawn(hub.run());
            info!("websocket egress active");
            Ok(EventsEgress::Hub { handle, task })
        }
        ApiType::RabbitApi => {
            let client = exchange_client.ok_or(ConfigError::MissingExchangeClient)?;
            let (publisher, handle) = Publisher::new(
                client,
                ExchangesConfig {
                    events_exchange: config.rabbit_mq.events_exchange.clone(),
                    revert_events_exchange: config.rabbit_mq.revert_events_exchange.clone(),
                    finalized_events_exchange: config.rabbit_mq.finalized_events_exchange.clone(),
                },
            );
            let task = tokio::spawn(publisher.run());
            info!("rabbit-api egress active");
            Ok(EventsEgress::Fanout { handle, task })
        }
    }
}

/// Build the payload handler with the stock decoder registry (`v1`).
pub fn create_payload_handler(
    gateway: Arc<dyn BroadcastGateway>,
) -> Result<PayloadHandler, IngestError> {
    let mut decoders: HashMap<String, Arc<dyn PayloadDecoder>> = HashMap::new();
    decoders.insert(PAYLOAD_VERSION_V1.to_string(), Arc::new(JsonDecoderV1));
    PayloadHandler::new(decoders, gateway)
}
