//! # Versioned Payload Decoders
//!
//! Each upstream payload version gets an independent decoder, so a producer
//! format upgrade is hot-swappable: register the new version, keep serving
//! the old one.

use crate::error::IngestError;
use notifier_data::{BlockEvents, FinalizedBlock, RevertBlock};

/// Version key of the initial JSON payload format.
pub const PAYLOAD_VERSION_V1: &str = "v1";

/// Decodes the raw bytes of one upstream frame into a typed domain event.
pub trait PayloadDecoder: Send + Sync {
    /// Decode a `SaveBlock` frame.
    fn decode_block_events(&self, payload: &[u8]) -> Result<BlockEvents, IngestError>;

    /// Decode a `RevertIndexedBlock` frame.
    fn decode_revert(&self, payload: &[u8]) -> Result<RevertBlock, IngestError>;

    /// Decode a `FinalizedBlock` frame.
    fn decode_finalized(&self, payload: &[u8]) -> Result<FinalizedBlock, IngestError>;
}

/// The `v1` format: JSON with base64 byte fields, structural bounds
/// enforced on every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoderV1;

impl PayloadDecoder for JsonDecoderV1 {
    fn decode_block_events(&self, payload: &[u8]) -> Result<BlockEvents, IngestError> {
        let block_events: BlockEvents = serde_json::from_slice(payload)?;
        for event in &block_events.events {
            event
                .validate()
                .map_err(|err| IngestError::InvalidPayload {
                    reason: err.to_string(),
                })?;
        }
        Ok(block_events)
    }

    fn decode_revert(&self, payload: &[u8]) -> Result<RevertBlock, IngestError> {
        Ok(serde_json::from_slice(payload)?)
    }

    fn decode_finalized(&self, payload: &[u8]) -> Result<FinalizedBlock, IngestError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_data::MAX_EVENT_TOPICS;

    #[test]
    fn test_decode_block_events() {
        let payload = br#"{
            "hash": "0xaa",
            "shardID": 1,
            "timestamp": 1700000000,
            "events": [
                {"address": "erd1x", "identifier": "transfer", "topics": ["VDE="], "data": "AQ==", "txHash": "0xtx"}
            ]
        }"#;

        let block_events = JsonDecoderV1.decode_block_events(payload).unwrap();
        assert_eq!(block_events.hash, "0xaa");
        assert_eq!(block_events.shard_id, 1);
        assert_eq!(block_events.events.len(), 1);
        assert_eq!(block_events.events[0].topics, vec![b"T1".to_vec()]);
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = JsonDecoderV1.decode_block_events(b"not json").unwrap_err();
        assert!(matches!(err, IngestError::UpstreamDecode(_)));
    }

    #[test]
    fn test_decode_enforces_topic_bounds() {
        let topics: Vec<String> = (0..=MAX_EVENT_TOPICS).map(|_| "VDE=".to_string()).collect();
        let payload = serde_json::json!({
            "hash": "0xaa",
            "events": [{
                "address": "erd1x",
                "identifier": "transfer",
                "topics": topics,
                "data": "AQ==",
                "txHash": "0xtx"
            }]
        });

        let err = JsonDecoderV1
            .decode_block_events(payload.to_string().as_bytes())
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidPayload { .. }));
    }

    #[test]
    fn test_decode_revert_and_finalized() {
        let revert = JsonDecoderV1
            .decode_revert(br#"{"hash": "0xaa", "nonce": 4, "round": 5, "epoch": 1}"#)
            .unwrap();
        assert_eq!(revert.nonce, 4);

        let finalized = JsonDecoderV1
            .decode_finalized(br#"{"hash": "0xbb"}"#)
            .unwrap();
        assert_eq!(finalized.hash, "0xbb");
    }
}
