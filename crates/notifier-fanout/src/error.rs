//! Error types for the fanout publisher.

use thiserror::Error;

/// Errors surfaced by the publisher and its exchange client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The broker rejected or never acknowledged the publish.
    #[error("exchange publish failed: {reason}")]
    Publish { reason: String },

    /// The publisher has entered shutdown; no further messages are accepted.
    #[error("publisher is stopped")]
    Stopped,
}
