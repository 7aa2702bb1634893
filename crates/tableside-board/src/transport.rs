//! Abstraction over the pub/sub broker connection.
//!
//! The [`ConnectionManager`](crate::connection::ConnectionManager) only needs
//! three outbound operations and a stream of inbound [`TransportEvent`]s.
//! [`Transport`] captures the outbound half; the inbound half is an
//! [`mpsc::Receiver`] handed out by [`Connect::connect`] together with the
//! transport. Production code uses the MQTT implementation in
//! [`crate::mqtt`]; tests substitute an in-memory recorder.

use std::future::Future;

use tableside_types::DeliveryQos;
use tokio::sync::mpsc;

use crate::config::BoardConfig;
use crate::error::BoardError;

/// Capacity of the inbound event channel between the transport task and
/// the connection manager.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Something the broker connection reports to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection (initial or after a reconnect).
    Connected,
    /// A message arrived on a subscribed topic.
    Message {
        /// Topic the message was published on.
        topic: String,
        /// Raw payload bytes.
        payload: Vec<u8>,
    },
    /// The connection failed; the transport will retry on its own.
    Error(String),
    /// The transport has shut down and will not produce more events.
    Closed,
}

/// Outbound operations on a broker connection.
///
/// All methods only enqueue the request; completion is reported through the
/// transport's own events and logs.
pub trait Transport: Send + Sync + 'static {
    /// Subscribe to `topic`.
    fn subscribe(
        &self,
        topic: &str,
        qos: DeliveryQos,
    ) -> impl Future<Output = Result<(), BoardError>> + Send;

    /// Publish `payload` on `topic`.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: DeliveryQos,
    ) -> impl Future<Output = Result<(), BoardError>> + Send;

    /// Ask the broker to close the connection.
    fn disconnect(&self) -> impl Future<Output = Result<(), BoardError>> + Send;
}

/// Factory that opens a broker connection.
pub trait Connect: Send + Sync + 'static {
    /// The transport type this factory produces.
    type Transport: Transport;

    /// Open a connection for `client_id`.
    ///
    /// Returns the outbound transport and the receiver of inbound events.
    /// Must be called from within a tokio runtime if the implementation
    /// spawns background tasks.
    fn connect(
        &self,
        config: &BoardConfig,
        client_id: &str,
    ) -> Result<(Self::Transport, mpsc::Receiver<TransportEvent>), BoardError>;
}
