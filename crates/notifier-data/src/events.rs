//! # Chain Events
//!
//! Typed block-lifecycle occurrences pushed by the upstream observer node.
//!
//! ## Clusters
//!
//! - **Per-transaction**: [`Event`]
//! - **Per-block batches**: [`BlockEvents`]
//! - **Lifecycle signals**: [`RevertBlock`], [`FinalizedBlock`]

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use thiserror::Error;

/// Maximum number of topics a single event may carry.
pub const MAX_EVENT_TOPICS: usize = 64;

/// Maximum size of a single topic, in bytes.
pub const MAX_TOPIC_BYTES: usize = 256;

/// One atomic occurrence observed on-chain.
///
/// Addressed by `(address, identifier, topics)`; `data` is an opaque payload
/// the notifier never interprets.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Originating contract or account identifier, canonical string form.
    pub address: String,
    /// Event name, e.g. `transfer`.
    pub identifier: String,
    /// Ordered opaque topic values, rendered as base64 on the wire.
    #[serde_as(as = "Vec<Base64>")]
    #[serde(default)]
    pub topics: Vec<Vec<u8>>,
    /// Opaque event payload, rendered as base64 on the wire.
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub data: Vec<u8>,
    /// Hash of the transaction that emitted the event, hex.
    pub tx_hash: String,
}

/// Structural violation detected in a decoded [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEventError {
    /// More topics than the upstream contract allows.
    #[error("too many topics: {count} (max {MAX_EVENT_TOPICS})")]
    TooManyTopics { count: usize },

    /// A single topic exceeds the size bound.
    #[error("topic {index} is {size} bytes (max {MAX_TOPIC_BYTES})")]
    TopicTooLarge { index: usize, size: usize },
}

impl Event {
    /// Check the topic count and per-topic size bounds.
    pub fn validate(&self) -> Result<(), InvalidEventError> {
        if self.topics.len() > MAX_EVENT_TOPICS {
            return Err(InvalidEventError::TooManyTopics {
                count: self.topics.len(),
            });
        }
        for (index, topic) in self.topics.iter().enumerate() {
            if topic.len() > MAX_TOPIC_BYTES {
                return Err(InvalidEventError::TopicTooLarge {
                    index,
                    size: topic.len(),
                });
            }
        }
        Ok(())
    }
}

/// A batch of events bound to one block.
///
/// The order of `events` is the upstream-observed order and is preserved all
/// the way to each subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvents {
    /// Block hash, hex.
    pub hash: String,
    /// Shard the block belongs to.
    #[serde(rename = "shardID", default)]
    pub shard_id: u32,
    /// Block proposal time, unix seconds.
    #[serde(default)]
    pub timestamp: u64,
    /// Events in upstream order.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Signals that a previously announced block is no longer canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertBlock {
    /// Hash of the reverted block, hex.
    pub hash: String,
    /// Nonce of the reverted block.
    pub nonce: u64,
    /// Consensus round of the reverted block.
    #[serde(default)]
    pub round: u64,
    /// Epoch of the reverted block.
    #[serde(default)]
    pub epoch: u64,
}

/// Signals irreversible commitment of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedBlock {
    /// Hash of the finalized block, hex.
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            address: "erd1x".to_string(),
            identifier: "transfer".to_string(),
            topics: vec![b"T1".to_vec()],
            data: vec![0x01],
            tx_hash: "0xtx".to_string(),
        }
    }

    #[test]
    fn test_event_json_field_names() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["address"], "erd1x");
        assert_eq!(json["identifier"], "transfer");
        assert_eq!(json["txHash"], "0xtx");
        // base64 of "T1"
        assert_eq!(json["topics"][0], "VDE=");
    }

    #[test]
    fn test_block_events_shard_id_wire_name() {
        let batch = BlockEvents {
            hash: "0xaa".to_string(),
            shard_id: 2,
            timestamp: 1_700_000_000,
            events: vec![sample_event()],
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["shardID"], 2);

        let back: BlockEvents = serde_json::from_value(json).unwrap();
        assert_eq!(back, batch);
    }

    #[test]
    fn test_validate_rejects_topic_overflow() {
        let mut event = sample_event();
        event.topics = vec![Vec::new(); MAX_EVENT_TOPICS + 1];
        assert!(matches!(
            event.validate(),
            Err(InvalidEventError::TooManyTopics { count }) if count == MAX_EVENT_TOPICS + 1
        ));

        let mut event = sample_event();
        event.topics = vec![vec![0u8; MAX_TOPIC_BYTES + 1]];
        assert!(matches!(
            event.validate(),
            Err(InvalidEventError::TopicTooLarge { index: 0, size }) if size == MAX_TOPIC_BYTES + 1
        ));

        assert!(sample_event().validate().is_ok());
    }
}
