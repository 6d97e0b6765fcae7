//! Outbound port: where decoded events go.

use notifier_data::{BlockEvents, FinalizedBlock, RevertBlock};
use thiserror::Error;

/// The egress side refused the message because it is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("broadcast gateway closed")]
pub struct GatewayClosed;

/// Consumer contract shared by the subscriber hub and the fanout publisher.
///
/// Handing a message over is non-blocking; the implementation buffers it on
/// its inbound channel. The only failure mode is a closed egress.
pub trait BroadcastGateway: Send + Sync {
    /// Forward a decoded block batch.
    fn broadcast(&self, events: BlockEvents) -> Result<(), GatewayClosed>;

    /// Forward a revert signal.
    fn broadcast_revert(&self, event: RevertBlock) -> Result<(), GatewayClosed>;

    /// Forward a finality signal.
    fn broadcast_finalized(&self, event: FinalizedBlock) -> Result<(), GatewayClosed>;
}
