//! Domain error types.

use common::{Money, ProductId};
use thiserror::Error;

use crate::order::OrderStatus;

/// Violations of the order invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An order must contain at least one item.
    #[error("Order has no items")]
    NoItems,

    /// Every line item needs a positive quantity.
    #[error("Invalid quantity for product {product_id}: must be greater than zero")]
    InvalidQuantity { product_id: ProductId },

    /// Unit prices cannot be negative.
    #[error("Invalid price for product {product_id}: {price}")]
    InvalidPrice { product_id: ProductId, price: Money },

    /// The recorded total differs from the sum of item subtotals.
    #[error("Order total {actual} does not match item subtotals {expected}")]
    TotalMismatch { expected: Money, actual: Money },

    /// The total does not fit in the money representation.
    #[error("Order total overflows")]
    TotalOverflow,

    /// The requested status change is not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}
