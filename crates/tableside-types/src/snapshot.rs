//! Serializable projection of the order board for rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::TableId;
use crate::messages::Order;

/// Point-in-time copy of everything the board shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BoardSnapshot {
    /// Ready-food display lines per table, in arrival order.
    pub table_food: BTreeMap<TableId, Vec<String>>,
    /// Error display lines per table; table `0` collects unattributed ones.
    pub errors: BTreeMap<TableId, Vec<String>>,
    /// Orders published but not yet answered, keyed by order id.
    pub in_flight: BTreeMap<String, Order>,
}

impl BoardSnapshot {
    /// Number of orders still waiting on the kitchen.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }
}
