//! Order model, lifecycle and events.

mod events;
mod model;
mod state;
mod value_objects;

pub use events::{DomainEvent, ORDER_CREATED_TOPIC, OrderCreatedEvent, OrderEvent};
pub use model::{NewOrder, Order};
pub use state::OrderStatus;
pub use value_objects::{CartItem, OrderItem};
