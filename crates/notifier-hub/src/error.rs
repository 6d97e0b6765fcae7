//! Error types for the hub crate.

use notifier_data::DispatcherId;
use thiserror::Error;

/// Errors surfaced by [`crate::HubHandle`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub has entered shutdown; no further messages are accepted.
    #[error("hub is stopped")]
    Stopped,
}

/// Errors from pushing a frame onto a dispatcher's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The bounded outbound queue is full; the subscriber is too slow and
    /// must be disconnected rather than waited on.
    #[error("outbound queue full for dispatcher {dispatcher_id}")]
    QueueFull { dispatcher_id: DispatcherId },
}

/// Errors from a dispatcher transport write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The write failed; the connection is considered dead.
    #[error("transport write failed: {reason}")]
    Write { reason: String },

    /// The peer already closed the connection.
    #[error("transport closed")]
    Closed,
}
