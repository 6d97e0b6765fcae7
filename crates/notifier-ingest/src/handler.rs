//! # Payload Handler
//!
//! Topic-dispatched entry point invoked by the upstream duplex host for
//! every received frame.

use crate::decoder::PayloadDecoder;
use crate::error::IngestError;
use crate::ports::BroadcastGateway;
use crate::topics;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes `(bytes, topic, version)` frames through the decoder registry to
/// the active broadcast gateway.
pub struct PayloadHandler {
    decoders: HashMap<String, Arc<dyn PayloadDecoder>>,
    gateway: Arc<dyn BroadcastGateway>,
}

impl PayloadHandler {
    /// Build a handler over a version-keyed decoder registry.
    pub fn new(
        decoders: HashMap<String, Arc<dyn PayloadDecoder>>,
        gateway: Arc<dyn BroadcastGateway>,
    ) -> Result<Self, IngestError> {
        if decoders.is_empty() {
            return Err(IngestError::EmptyDecoderRegistry);
        }
        Ok(Self { decoders, gateway })
    }

    /// Process one upstream frame.
    ///
    /// Unknown topics succeed without effect, for forward-compatibility with
    /// producers that emit topics this notifier does not carry.
    pub fn process_payload(
        &self,
        payload: &[u8],
        topic: &str,
        version: &str,
    ) -> Result<(), IngestError> {
        match topic {
            topics::SAVE_BLOCK => self.save_block(payload, version),
            topics::REVERT_INDEXED_BLOCK => self.revert_indexed_block(payload, version),
            topics::FINALIZED_BLOCK => self.finalized_block(payload, version),
            topics::SAVE_ROUNDS_INFO
            | topics::SAVE_VALIDATORS_RATING
            | topics::SAVE_VALIDATORS_PUB_KEYS
            | topics::SAVE_ACCOUNTS => {
                debug!(topic, "topic accepted and discarded");
                Ok(())
            }
            _ => {
                warn!(topic, "unknown payload topic, ignored");
                Ok(())
            }
        }
    }

    fn save_block(&self, payload: &[u8], version: &str) -> Result<(), IngestError> {
        let decoder = self.decoder_for(version)?;
        let block_events = decoder.decode_block_events(payload)?;
        debug!(
            block_hash = %block_events.hash,
            events = block_events.events.len(),
            version,
            "decoded block events"
        );
        self.gateway
            .broadcast(block_events)
            .map_err(|_| IngestError::GatewayClosed)
    }

    fn revert_indexed_block(&self, payload: &[u8], version: &str) -> Result<(), IngestError> {
        let decoder = self.decoder_for(version)?;
        let revert = decoder.decode_revert(payload)?;
        debug!(block_hash = %revert.hash, version, "decoded revert block");
        self.gateway
            .broadcast_revert(revert)
            .map_err(|_| IngestError::GatewayClosed)
    }

    fn finalized_block(&self, payload: &[u8], version: &str) -> Result<(), IngestError> {
        let decoder = self.decoder_for(version)?;
        let finalized = decoder.decode_finalized(payload)?;
        debug!(block_hash = %finalized.hash, version, "decoded finalized block");
        self.gateway
            .broadcast_finalized(finalized)
            .map_err(|_| IngestError::GatewayClosed)
    }

    fn decoder_for(&self, version: &str) -> Result<&Arc<dyn PayloadDecoder>, IngestError> {
        self.decoders.get(version).ok_or_else(|| {
            warn!(version, "no decoder for payload version");
            IngestError::InvalidPayloadVersion {
                version: version.to_string(),
            }
        })
    }
}
