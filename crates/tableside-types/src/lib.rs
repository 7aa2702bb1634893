//! Shared type definitions for the Tableside order board.
//!
//! This crate is the single source of truth for the payloads exchanged with
//! the kitchen backend over the broker. Types flow to `TypeScript` via
//! `ts-rs` for the Svelte front end.
//!
//! # Modules
//!
//! - [`ids`] -- Table identifiers
//! - [`messages`] -- Order and food-event payloads, delivery levels
//! - [`topics`] -- Broker topic naming
//! - [`snapshot`] -- Renderable board projection

pub mod ids;
pub mod messages;
pub mod snapshot;
pub mod topics;

pub use ids::TableId;
pub use messages::{DeliveryQos, FoodEvent, FoodStatus, Order};
pub use snapshot::BoardSnapshot;
