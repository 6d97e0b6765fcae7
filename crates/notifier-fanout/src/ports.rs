//! Outbound port: the broker client capability the publisher consumes.

use crate::error::PublishError;
use async_trait::async_trait;

/// Publish capability of an AMQP-style broker connection.
///
/// The concrete client (connection management, channels, reconnects) lives
/// outside this crate; the publisher only needs a blocking publish.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Publish one message to `exchange`.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        mandatory: bool,
        immediate: bool,
        body: Vec<u8>,
    ) -> Result<(), PublishError>;
}
