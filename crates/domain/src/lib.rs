//! Domain layer for order fulfillment.
//!
//! This crate provides:
//! - [`NewOrder`] / [`Order`] with the total and non-empty invariants enforced on construction
//! - [`OrderStatus`] lifecycle (`pending → completed | failed`)
//! - [`OrderEvent`], the versioned schema published when an order is created

pub mod error;
pub mod order;

pub use common::{Money, OrderId, ProductId, UserId};
pub use error::ValidationError;
pub use order::{
    CartItem, DomainEvent, NewOrder, ORDER_CREATED_TOPIC, Order, OrderCreatedEvent, OrderEvent,
    OrderItem, OrderStatus,
};
