//! Gateway adapters connecting the ingest port to the egress actors.

use notifier_data::{BlockEvents, FinalizedBlock, RevertBlock};
use notifier_fanout::PublisherHandle;
use notifier_hub::HubHandle;
use notifier_ingest::{BroadcastGateway, GatewayClosed};
use tracing::trace;

/// Ingest-facing view of the subscriber hub.
#[derive(Debug, Clone)]
pub struct HubGateway {
    hub: HubHandle,
}

impl HubGateway {
    /// Wrap a hub handle.
    #[must_use]
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }
}

impl BroadcastGateway for HubGateway {
    fn broadcast(&self, events: BlockEvents) -> Result<(), GatewayClosed> {
        self.hub.broadcast(events).map_err(|_| GatewayClosed)
    }

    fn broadcast_revert(&self, event: RevertBlock) -> Result<(), GatewayClosed> {
        self.hub.broadcast_revert(event).map_err(|_| GatewayClosed)
    }

    fn broadcast_finalized(&self, event: FinalizedBlock) -> Result<(), GatewayClosed> {
        self.hub
            .broadcast_finalized(event)
            .map_err(|_| GatewayClosed)
    }
}

/// Ingest-facing view of the fanout publisher.
#[derive(Debug, Clone)]
pub struct FanoutGateway {
    publisher: PublisherHandle,
}

impl FanoutGateway {
    /// Wrap a publisher handle.
    #[must_use]
    pub fn new(publisher: PublisherHandle) -> Self {
        Self { publisher }
    }
}

impl BroadcastGateway for FanoutGateway {
    fn broadcast(&self, events: BlockEvents) -> Result<(), GatewayClosed> {
        self.publisher.broadcast(events).map_err(|_| GatewayClosed)
    }

    fn broadcast_revert(&self, event: RevertBlock) -> Result<(), GatewayClosed> {
        self.publisher
            .broadcast_revert(event)
            .map_err(|_| GatewayClosed)
    }

    fn broadcast_finalized(&self, event: FinalizedBlock) -> Result<(), GatewayClosed> {
        self.publisher
            .broadcast_finalized(event)
            .map_err(|_| GatewayClosed)
    }
}

/// No-op gateway for the inactive egress side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

impl BroadcastGateway for DisabledGateway {
    fn broadcast(&self, _events: BlockEvents) -> Result<(), GatewayClosed> {
        trace!("egress disabled, block events dropped");
        Ok(())
    }

    fn broadcast_revert(&self, _event: RevertBlock) -> Result<(), GatewayClosed> {
        trace!("egress disabled, revert event dropped");
        Ok(())
    }

    fn broadcast_finalized(&self, _event: FinalizedBlock) -> Result<(), GatewayClosed> {
        trace!("egress disabled, finalized event dropped");
        Ok(())
    }
}
