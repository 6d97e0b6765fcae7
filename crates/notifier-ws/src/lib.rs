//! # Notifier WebSocket Adapter
//!
//! Binds subscriber sockets to the hub: the write half becomes a dispatcher
//! transport, the read half carries subscribe control messages.
//!
//! The HTTP server owning the routes lives outside this crate; it mounts
//! [`subscriber_socket`] (or drives [`WsConnection`] directly) on whatever
//! path it exposes.

pub mod connection;
pub mod transport;

pub use connection::{subscriber_socket, WsConnection, WsState};
pub use transport::WsTransport;
