//! Live order board for the Tableside front of house.
//!
//! A [`Session`] owns one lazily opened broker connection. The connection
//! subscribes to the kitchen's per-table food topics, decodes every event,
//! and applies it to the session's [`Board`], whose [`Store`]s notify UI
//! listeners on each change. Orders go out the other way through
//! [`publish_order`].
//!
//! # Modules
//!
//! - [`store`] -- Observable value containers
//! - [`board`] -- Board state and the ready/error reducers
//! - [`connection`] -- Event dispatch and connection state
//! - [`session`] -- Single-connection ownership
//! - [`orders`] -- Outbound order publishing
//! - [`transport`] -- Broker abstraction
//! - [`mqtt`] -- MQTT transport over `WebSocket` or TCP
//! - [`memory`] -- In-process broker for offline runs and tests
//! - [`config`] -- Environment configuration
//! - [`error`] -- Error type

pub mod board;
pub mod config;
pub mod connection;
pub mod error;
pub mod memory;
pub mod mqtt;
pub mod orders;
pub mod session;
pub mod store;
pub mod transport;

pub use board::Board;
pub use config::BoardConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::BoardError;
pub use memory::MemoryBroker;
pub use mqtt::MqttConnector;
pub use orders::publish_order;
pub use session::{ClientHandle, Session};
pub use store::{Store, Subscription};
pub use transport::{Connect, Transport, TransportEvent};
