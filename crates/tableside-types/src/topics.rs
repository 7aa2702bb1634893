//! Broker topic naming shared with the kitchen backend.
//!
//! - **Order publish:** `restaurant/orders/{table}`
//! - **Food subscribe:** `restaurant/foods/{table}` for every table, plus
//!   `restaurant/foods/0` where the kitchen reports events it could not
//!   attribute to a table.

use crate::ids::TableId;

/// Prefix of the topics the kitchen publishes food events on.
pub const FOOD_TOPIC_PREFIX: &str = "restaurant/foods/";

/// Prefix of the topics the board publishes orders on.
pub const ORDER_TOPIC_PREFIX: &str = "restaurant/orders/";

/// Topic carrying food events for `table`.
pub fn food_topic(table: TableId) -> String {
    format!("{FOOD_TOPIC_PREFIX}{table}")
}

/// Topic an order for `table` is published on.
pub fn order_topic(table: TableId) -> String {
    format!("{ORDER_TOPIC_PREFIX}{table}")
}

/// Every food topic the board listens to for `table_count` tables.
///
/// Tables `1..=table_count` come first, followed by the unknown-table
/// topic. The list never contains duplicates.
pub fn subscription_topics(table_count: u32) -> Vec<String> {
    (1..=table_count)
        .map(TableId::from)
        .chain(std::iter::once(TableId::UNKNOWN))
        .map(food_topic)
        .collect()
}

/// Extract the table number from a food topic.
///
/// Returns `None` if the topic does not start with [`FOOD_TOPIC_PREFIX`]
/// or the suffix is not an integer.
pub fn table_from_topic(topic: &str) -> Option<TableId> {
    topic
        .strip_prefix(FOOD_TOPIC_PREFIX)
        .and_then(|suffix| suffix.parse::<i64>().ok())
        .map(TableId::new)
}
