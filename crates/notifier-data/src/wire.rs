//! # Subscriber Wire Frames
//!
//! Every frame delivered to a subscriber socket has the shape
//! `{"type": <kind>, "data": <typed payload>}`.

use crate::events::{Event, FinalizedBlock, RevertBlock};
use serde::{Deserialize, Serialize};

/// Discriminator for outbound subscriber frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventKind {
    /// A list of matched [`Event`]s from one block batch.
    BlockEvents,
    /// A single [`RevertBlock`] signal.
    RevertEvent,
    /// A single [`FinalizedBlock`] signal.
    FinalizedEvent,
}

/// One outbound subscriber frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    /// Frame discriminator.
    #[serde(rename = "type")]
    pub kind: WireEventKind,
    /// The typed payload, already rendered to JSON.
    pub data: serde_json::Value,
}

impl WireEvent {
    /// Frame carrying the events matched for one subscriber from one batch.
    pub fn block_events(events: &[Event]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: WireEventKind::BlockEvents,
            data: serde_json::to_value(events)?,
        })
    }

    /// Frame carrying a revert signal.
    pub fn revert_event(event: &RevertBlock) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: WireEventKind::RevertEvent,
            data: serde_json::to_value(event)?,
        })
    }

    /// Frame carrying a finality signal.
    pub fn finalized_event(event: &FinalizedBlock) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: WireEventKind::FinalizedEvent,
            data: serde_json::to_value(event)?,
        })
    }
}
