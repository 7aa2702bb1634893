//! Payloads exchanged with the kitchen backend over the broker.
//!
//! - [`Order`] is published by the board on `restaurant/orders/<table>`.
//! - [`FoodEvent`] arrives on `restaurant/foods/<table>` once the kitchen has
//!   either prepared the food or rejected the order.
//!
//! Field names are camelCase on the wire and must not change: the backend
//! is deployed independently of this workspace.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::ids::TableId;

/// A request for food at a table.
///
/// Created by the front end when a guest orders and never mutated after
/// creation. It is tracked in the board's in-flight map until the kitchen
/// answers with a [`FoodEvent`] carrying the same `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Order {
    /// Caller-generated unique identifier.
    pub order_id: String,
    /// Table the food is for.
    pub table: TableId,
    /// Free-form name of the dish.
    pub food: String,
    /// Creation time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub ts: i64,
}

impl Order {
    /// Create an order stamped with a fresh time-ordered id and the current
    /// wall-clock time.
    pub fn new(table: TableId, food: impl Into<String>) -> Self {
        Self {
            order_id: Uuid::now_v7().to_string(),
            table,
            food: food.into(),
            ts: Utc::now().timestamp_millis(),
        }
    }
}

/// Outcome reported by the kitchen for a single order.
///
/// Any status string other than `"ready"` or `"error"` (including a missing
/// or non-string status) decodes to [`FoodStatus::Unrecognized`], which the
/// board deliberately ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum FoodStatus {
    /// The food was prepared.
    Ready,
    /// The kitchen rejected or failed the order.
    Error,
    /// Anything else the backend might send.
    #[default]
    #[serde(other)]
    Unrecognized,
}

/// Asynchronous status update about an order.
///
/// Every field except `status` is optional on the wire. The kitchen sends
/// best-effort values for orders it could not validate (for example an
/// empty `orderId` and table `0`), so decoding is lenient and the reducers
/// decide how to degrade:
///
/// - `orderId` and `food`: `null` reads as empty, numbers and booleans as
///   their JSON text.
/// - `prepMs`: anything that is not a whole number of milliseconds in range
///   reads as absent. Numeric strings such as `"1200"` are accepted.
/// - `error`: `null` reads as absent, any other non-string as its JSON text.
///
/// Only a `table` of the wrong type fails the whole event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FoodEvent {
    /// Identifier of the order this event resolves (may be empty).
    #[serde(default, deserialize_with = "lenient_text")]
    pub order_id: String,
    /// Table the event belongs to, if the backend could attribute it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub table: Option<TableId>,
    /// Name of the dish (may be empty).
    #[serde(default, deserialize_with = "lenient_text")]
    pub food: String,
    /// Outcome of the order.
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: FoodStatus,
    /// Preparation time in milliseconds, present on ready events.
    #[serde(
        default,
        deserialize_with = "lenient_prep_ms",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub prep_ms: Option<u32>,
    /// Human-readable failure reason, present on error events.
    #[serde(
        default,
        deserialize_with = "lenient_error",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub error: Option<String>,
}

impl FoodEvent {
    /// Build a ready event, as the kitchen would publish it.
    pub fn ready(order: &Order, prep_ms: u32) -> Self {
        Self {
            order_id: order.order_id.clone(),
            table: Some(order.table),
            food: order.food.clone(),
            status: FoodStatus::Ready,
            prep_ms: Some(prep_ms),
            error: None,
        }
    }

    /// Build an error event for an order.
    pub fn failed(order: &Order, message: impl Into<String>) -> Self {
        Self {
            order_id: order.order_id.clone(),
            table: Some(order.table),
            food: order.food.clone(),
            status: FoodStatus::Error,
            prep_ms: None,
            error: Some(message.into()),
        }
    }

    /// Parse an event from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when the text is not
    /// JSON, is not an object, or carries a `table` that is not an integer.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Preparation time if the backend sent a non-zero one.
    pub fn reported_prep_ms(&self) -> Option<u32> {
        self.prep_ms.filter(|ms| *ms != 0)
    }

    /// Failure reason if the backend sent a non-empty one.
    pub fn reported_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|msg| !msg.is_empty())
    }
}

/// Map any JSON value to a [`FoodStatus`] without failing.
fn lenient_status<'de, D>(deserializer: D) -> Result<FoodStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(serde_json::Value::as_str) {
        Some("ready") => FoodStatus::Ready,
        Some("error") => FoodStatus::Error,
        _ => FoodStatus::Unrecognized,
    })
}

/// Read a string field, accepting `null` and scalar JSON values.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

/// Read the failure reason, keeping any non-null value as text.
fn lenient_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// Read the preparation time, dropping values that are not whole
/// milliseconds within `u32`.
fn lenient_prep_ms<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(prep_ms_from_value))
}

fn prep_ms_from_value(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(number) => number
            .as_u64()
            .and_then(|ms| u32::try_from(ms).ok())
            // `1200.0` prints as `1200`; fractional or negative values fail here.
            .or_else(|| number.as_f64().and_then(|ms| format!("{ms}").parse().ok())),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Broker delivery guarantee requested for a publish or subscribe.
///
/// Values match the MQTT quality-of-service levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryQos {
    /// Fire and forget.
    #[default]
    AtMostOnce,
    /// Acknowledged delivery; duplicates are possible.
    AtLeastOnce,
    /// Acknowledged, de-duplicated delivery.
    ExactlyOnce,
}

impl DeliveryQos {
    /// Numeric QoS level as used on the wire.
    pub const fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }

    /// Whether the broker must acknowledge the delivery.
    pub const fn requires_ack(self) -> bool {
        !matches!(self, Self::AtMostOnce)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn order_uses_camel_case_keys() {
        let order = Order {
            order_id: "o1".to_owned(),
            table: TableId::new(3),
            food: "Pasta".to_owned(),
            ts: 1,
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"orderId": "o1", "table": 3, "food": "Pasta", "ts": 1})
        );
    }

    #[test]
    fn new_order_gets_unique_id_and_timestamp() {
        let a = Order::new(TableId::new(1), "Soup");
        let b = Order::new(TableId::new(1), "Soup");
        assert_ne!(a.order_id, b.order_id);
        assert!(a.ts > 0);
        assert_eq!(a.food, "Soup");
    }

    #[test]
    fn decodes_ready_event() {
        let evt = FoodEvent::from_json(
            r#"{"orderId":"o1","table":2,"food":"Pizza","status":"ready","prepMs":1200}"#,
        )
        .unwrap();
        assert_eq!(evt.status, FoodStatus::Ready);
        assert_eq!(evt.table, Some(TableId::new(2)));
        assert_eq!(evt.reported_prep_ms(), Some(1200));
        assert_eq!(evt.error, None);
    }

    #[test]
    fn decodes_backend_error_for_invalid_order() {
        let evt = FoodEvent::from_json(
            r#"{"orderId":"","table":0,"food":"","status":"error","prepMs":null,"error":"invalid order"}"#,
        )
        .unwrap();
        assert_eq!(evt.status, FoodStatus::Error);
        assert_eq!(evt.table, Some(TableId::UNKNOWN));
        assert_eq!(evt.reported_error(), Some("invalid order"));
        assert_eq!(evt.prep_ms, None);
    }

    #[test]
    fn unknown_or_missing_status_is_unrecognized() {
        let unknown = FoodEvent::from_json(r#"{"orderId":"x","status":"cooking"}"#).unwrap();
        assert_eq!(unknown.status, FoodStatus::Unrecognized);

        let missing = FoodEvent::from_json(r#"{"orderId":"x"}"#).unwrap();
        assert_eq!(missing.status, FoodStatus::Unrecognized);

        let numeric = FoodEvent::from_json(r#"{"status":7}"#).unwrap();
        assert_eq!(numeric.status, FoodStatus::Unrecognized);
    }

    #[test]
    fn missing_fields_default() {
        let evt = FoodEvent::from_json(r#"{"status":"error"}"#).unwrap();
        assert!(evt.order_id.is_empty());
        assert!(evt.food.is_empty());
        assert_eq!(evt.table, None);
        assert_eq!(evt.reported_error(), None);
    }

    #[test]
    fn zero_prep_and_empty_error_are_not_reported() {
        let evt =
            FoodEvent::from_json(r#"{"status":"ready","prepMs":0,"error":""}"#).unwrap();
        assert_eq!(evt.reported_prep_ms(), None);
        assert_eq!(evt.reported_error(), None);
    }

    #[test]
    fn malformed_prep_ms_reads_as_absent() {
        for raw in ["-5", "1200.5", "5000000000", "true", "{}", "\"soon\""] {
            let json = format!(r#"{{"orderId":"a","status":"ready","prepMs":{raw}}}"#);
            let evt = FoodEvent::from_json(&json).unwrap();
            assert_eq!(evt.reported_prep_ms(), None, "prepMs {raw}");
        }
    }

    #[test]
    fn whole_float_and_numeric_string_prep_ms_are_kept() {
        let float = FoodEvent::from_json(r#"{"status":"ready","prepMs":1200.0}"#).unwrap();
        assert_eq!(float.reported_prep_ms(), Some(1200));

        let text = FoodEvent::from_json(r#"{"status":"ready","prepMs":"1200"}"#).unwrap();
        assert_eq!(text.reported_prep_ms(), Some(1200));
    }

    #[test]
    fn non_string_error_is_kept_as_text() {
        let number = FoodEvent::from_json(r#"{"status":"error","error":42}"#).unwrap();
        assert_eq!(number.reported_error(), Some("42"));

        let null = FoodEvent::from_json(r#"{"status":"error","error":null}"#).unwrap();
        assert_eq!(null.reported_error(), None);
    }

    #[test]
    fn null_order_id_and_food_read_as_empty() {
        let evt =
            FoodEvent::from_json(r#"{"orderId":null,"food":null,"status":"error"}"#).unwrap();
        assert!(evt.order_id.is_empty());
        assert!(evt.food.is_empty());

        let numeric = FoodEvent::from_json(r#"{"orderId":17,"status":"ready"}"#).unwrap();
        assert_eq!(numeric.order_id, "17");
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(FoodEvent::from_json("not json").is_err());
        assert!(FoodEvent::from_json("[1,2,3]").is_err());
        assert!(FoodEvent::from_json(r#"{"table":"two","status":"ready"}"#).is_err());
    }

    #[test]
    fn ready_event_omits_error_field() {
        let order = Order {
            order_id: "o9".to_owned(),
            table: TableId::new(4),
            food: "Tea".to_owned(),
            ts: 5,
        };
        let value = serde_json::to_value(FoodEvent::ready(&order, 800)).unwrap();
        assert_eq!(value.get("status"), Some(&serde_json::json!("ready")));
        assert_eq!(value.get("prepMs"), Some(&serde_json::json!(800)));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn qos_levels_match_mqtt() {
        assert_eq!(DeliveryQos::AtMostOnce.level(), 0);
        assert_eq!(DeliveryQos::AtLeastOnce.level(), 1);
        assert_eq!(DeliveryQos::ExactlyOnce.level(), 2);
        assert!(DeliveryQos::AtLeastOnce.requires_ack());
        assert!(!DeliveryQos::AtMostOnce.requires_ack());
    }
}
