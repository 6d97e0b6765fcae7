//! Error types for the ingest pipeline.

use thiserror::Error;

/// Errors from processing one upstream frame.
///
/// Unknown topics are deliberately not represented here: they are ignored
/// for forward-compatibility, not failed.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No decoder is registered for the frame's version.
    #[error("invalid payload version: {version}")]
    InvalidPayloadVersion { version: String },

    /// The frame decoded, but its content violates a structural bound.
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// The frame bytes are not a well-formed payload.
    #[error("upstream decode failed: {0}")]
    UpstreamDecode(#[from] serde_json::Error),

    /// The registry was constructed without any decoder.
    #[error("no payload decoders registered")]
    EmptyDecoderRegistry,

    /// The egress side has shut down; the frame cannot be delivered.
    #[error("broadcast gateway closed")]
    GatewayClosed,
}
