//! Outbound order publishing.

use tableside_types::topics::order_topic;
use tableside_types::{DeliveryQos, Order};
use tracing::{debug, warn};

use crate::error::BoardError;
use crate::session::Session;
use crate::transport::Connect;

/// Orders are delivered at least once.
pub const ORDER_QOS: DeliveryQos = DeliveryQos::AtLeastOnce;

/// Publish `order` as JSON on `restaurant/orders/<table>`.
///
/// Opens the session's connection if needed. Does not track the order;
/// callers add it to the board's in-flight map themselves.
///
/// # Errors
///
/// Returns an error if the connection cannot be created, the order cannot
/// be serialized, or the publish request could not be queued. Failures are
/// also logged.
pub async fn publish_order<C: Connect>(
    session: &Session<C>,
    order: &Order,
) -> Result<(), BoardError> {
    let client = session.get_client()?;
    let topic = order_topic(order.table);
    let payload = serde_json::to_vec(order)?;

    match client.publish(&topic, payload, ORDER_QOS).await {
        Ok(()) => {
            debug!(topic = topic, order_id = order.order_id, "order published");
            Ok(())
        }
        Err(e) => {
            warn!(topic = topic, order_id = order.order_id, error = %e, "order publish failed");
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tableside_types::TableId;

    use super::*;
    use crate::config::BoardConfig;
    use crate::memory::MemoryBroker;

    fn order(id: &str, table: i64, food: &str) -> Order {
        Order {
            order_id: id.to_owned(),
            table: TableId::new(table),
            food: food.to_owned(),
            ts: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn publishes_json_on_table_topic_at_least_once() {
        let broker = MemoryBroker::new();
        let session = Session::new(broker.clone(), BoardConfig::default());

        publish_order(&session, &order("o1", 3, "Pasta")).await.unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 1);
        let first = published.first().unwrap();
        assert_eq!(first.topic, "restaurant/orders/3");
        assert_eq!(first.qos.level(), 1);

        let body: serde_json::Value = serde_json::from_slice(&first.payload).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "orderId": "o1",
                "table": 3,
                "food": "Pasta",
                "ts": 1_700_000_000_000_i64,
            })
        );
    }

    #[tokio::test]
    async fn publishing_leaves_in_flight_untouched() {
        let broker = MemoryBroker::new();
        let session = Session::new(broker, BoardConfig::default());

        publish_order(&session, &order("o2", 1, "Soup")).await.unwrap();

        assert!(session.board().in_flight().get().is_empty());
    }

    #[tokio::test]
    async fn reuses_the_session_connection() {
        let broker = MemoryBroker::new();
        let session = Session::new(broker.clone(), BoardConfig::default());

        publish_order(&session, &order("a", 1, "Tea")).await.unwrap();
        publish_order(&session, &order("b", 2, "Cake")).await.unwrap();

        assert_eq!(broker.connect_count(), 1);
        let topics: Vec<_> = broker.published().into_iter().map(|p| p.topic).collect();
        assert_eq!(topics, vec!["restaurant/orders/1", "restaurant/orders/2"]);
    }
}
