//! Saga error types.

use common::ProductId;
use domain::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to the caller of an order creation.
///
/// Every failure before persistence leaves no order behind. Compensation
/// problems are never reported here; see [`CompensationFailed`].
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line asked for zero units.
    #[error("Invalid quantity for product {product_id}: must be greater than zero")]
    InvalidQuantity { product_id: ProductId },

    /// The product could not be priced or its stock could not be reached.
    #[error("Product {product_id} is unavailable: {reason}")]
    ProductUnavailable {
        product_id: ProductId,
        reason: String,
    },

    /// The ledger refused the deduction.
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    /// The order store did not accept the order.
    #[error("Failed to persist order: {0}")]
    PersistenceFailed(String),

    /// The caller's deadline expired during the named step.
    #[error("Deadline exceeded during {step}")]
    Timeout { step: &'static str },
}

impl OrderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::EmptyCart => "empty_cart",
            OrderError::InvalidQuantity { .. } => "invalid_quantity",
            OrderError::ProductUnavailable { .. } => "product_unavailable",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::PersistenceFailed(_) => "persistence_failed",
            OrderError::Timeout { .. } => "timeout",
        }
    }
}

/// Errors raised by the collaborators the saga calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The collaborator is unreachable or refused the call.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The payload broke an order invariant.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// A compensating restock that could not be applied.
///
/// Operator-facing only: real stock is understated by `quantity` until the
/// deduction is reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Compensation failed for product {product_id} (quantity {quantity}): {reason}")]
pub struct CompensationFailed {
    pub product_id: ProductId,
    pub quantity: u32,
    pub reason: String,
}
