//! Integration events published when orders are created.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{Order, OrderItem, OrderStatus};

/// Topic that order-created events are published on.
pub const ORDER_CREATED_TOPIC: &str = "order.created";

/// Trait for events that leave the service.
///
/// Events are immutable facts named in past tense. The type name is part of
/// the wire format and must stay stable once published.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the versioned event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the topic this event is published on.
    fn topic(&self) -> &'static str;
}

/// Versioned events about orders.
///
/// New schema versions are added as new variants; existing variants never change shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// An order was persisted and its stock deducted.
    #[serde(rename = "order.created.v1")]
    OrderCreatedV1(OrderCreatedEvent),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreatedV1(_) => "order.created.v1",
        }
    }

    fn topic(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreatedV1(_) => ORDER_CREATED_TOPIC,
        }
    }
}

impl OrderEvent {
    /// Creates an order-created event from a persisted order.
    pub fn order_created(order: &Order) -> Self {
        OrderEvent::OrderCreatedV1(OrderCreatedEvent::from(order))
    }

    /// Returns the order the event is about. Consumers deduplicate on this.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreatedV1(data) => data.order_id,
        }
    }

    /// Serializes the event for an event sink.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses an event received from an event sink.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Snapshot of an order at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    /// Stable order ID; identical across redeliveries.
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderCreatedEvent {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id.clone(),
            total_amount: order.total_amount,
            status: order.status,
            items: order.items.clone(),
            created_at: order.created_at,
        }
    }
}
