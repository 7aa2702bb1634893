//! Connection manager bridging broker events into the board.
//!
//! The [`ConnectionManager`] owns one [`Transport`] and consumes its event
//! stream:
//!
//! - **Connected:** subscribe to `restaurant/foods/{1..=N}` and
//!   `restaurant/foods/0`. Every (re)connect re-issues all subscriptions;
//!   the broker treats repeats as no-ops.
//! - **Message:** decode the payload as UTF-8 JSON into a
//!   [`FoodEvent`] and hand it to the [`Board`]. Bad payloads are logged and
//!   dropped; they never reach the stores.
//! - **Error:** log only. The transport reconnects by itself, pending
//!   orders stay in flight.
//!
//! # States
//!
//! ```text
//! Disconnected --> Connecting --> Connected <--> Reconnecting
//!                                     |
//!                                     +--> Disconnected (close)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tableside_types::topics::{subscription_topics, table_from_topic};
use tableside_types::{DeliveryQos, FoodEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::BoardError;
use crate::store::Store;
use crate::transport::{Transport, TransportEvent};

/// Delivery level for the food-topic subscriptions.
const SUBSCRIBE_QOS: DeliveryQos = DeliveryQos::AtMostOnce;

/// Lifecycle of the single broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection exists.
    #[default]
    Disconnected,
    /// The connection was created and the broker has not answered yet.
    Connecting,
    /// The broker accepted the connection and subscriptions were issued.
    Connected,
    /// The connection dropped; the transport is retrying.
    Reconnecting,
}

/// Decode a raw payload into a [`FoodEvent`].
///
/// # Errors
///
/// Returns [`BoardError::Decode`] if the bytes are not UTF-8 and
/// [`BoardError::Parse`] if the text is not a food event.
pub fn decode_event(payload: &[u8]) -> Result<FoodEvent, BoardError> {
    let text = std::str::from_utf8(payload)?;
    FoodEvent::from_json(text).map_err(|e| BoardError::Parse(e.to_string()))
}

/// Owner of one broker connection and dispatcher of its events.
pub struct ConnectionManager<T> {
    transport: T,
    board: Board,
    state: Store<ConnectionState>,
    broker_url: String,
}

impl<T: Transport> ConnectionManager<T> {
    /// Wrap a freshly opened transport.
    ///
    /// Moves `state` to [`ConnectionState::Connecting`].
    pub fn new(
        transport: T,
        board: Board,
        state: Store<ConnectionState>,
        broker_url: impl Into<String>,
    ) -> Self {
        state.set(ConnectionState::Connecting);
        Self {
            transport,
            board,
            state,
            broker_url: broker_url.into(),
        }
    }

    /// Board this manager feeds.
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Observable connection state.
    pub const fn state(&self) -> &Store<ConnectionState> {
        &self.state
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// React to one transport event.
    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.mark_connected();
                self.subscribe_all().await;
            }
            TransportEvent::Message { topic, payload } => self.handle_message(&topic, &payload),
            TransportEvent::Error(message) => {
                warn!(broker = self.broker_url, error = message, "broker connection error");
                self.state.set(ConnectionState::Reconnecting);
            }
            TransportEvent::Closed => {
                info!(broker = self.broker_url, "broker connection closed");
                self.state.set(ConnectionState::Disconnected);
            }
        }
    }

    /// Decode and dispatch one inbound message.
    ///
    /// Accepts any byte-like payload (`&str`, `String`, `Vec<u8>`, ...).
    /// Never fails: undecodable payloads are logged and dropped.
    pub fn handle_message(&self, topic: &str, payload: impl AsRef<[u8]>) {
        match decode_event(payload.as_ref()) {
            Ok(event) => {
                debug!(
                    topic = topic,
                    topic_table = ?table_from_topic(topic),
                    order_id = event.order_id,
                    status = ?event.status,
                    "food event received"
                );
                self.board.apply(&event);
            }
            Err(e) => {
                warn!(topic = topic, error = %e, "dropping bad payload from broker");
            }
        }
    }

    /// Publish a raw payload through the transport.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Transport`] if the request could not be queued.
    pub async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: DeliveryQos,
    ) -> Result<(), BoardError> {
        self.transport.publish(topic, payload, qos).await
    }

    /// Consume transport events until the stream ends.
    ///
    /// Subscriptions issued on connect run in their own task: the transport
    /// may only accept them once its pending events have been received here.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Connected => {
                    self.mark_connected();
                    let manager = Arc::clone(&self);
                    tokio::spawn(async move { manager.subscribe_all().await });
                }
                TransportEvent::Closed => {
                    self.handle_event(TransportEvent::Closed).await;
                    break;
                }
                other => self.handle_event(other).await,
            }
        }
        self.state.set(ConnectionState::Disconnected);
        debug!(broker = self.broker_url, "connection manager stopped");
    }

    /// Disconnect from the broker.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Transport`] if the disconnect request could not
    /// be queued.
    pub async fn close(&self) -> Result<(), BoardError> {
        let result = self.transport.disconnect().await;
        self.state.set(ConnectionState::Disconnected);
        result
    }

    fn mark_connected(&self) {
        self.state.set(ConnectionState::Connected);
    }

    async fn subscribe_all(&self) {
        let topics = subscription_topics(self.board.table_count());
        for topic in &topics {
            if let Err(e) = self.transport.subscribe(topic, SUBSCRIBE_QOS).await {
                warn!(topic = topic, error = %e, "subscribe failed");
            }
        }
        info!(
            broker = self.broker_url,
            topics = topics.len(),
            "broker connected, food topics subscribed"
        );
    }
}

impl<T> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("broker_url", &self.broker_url)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
