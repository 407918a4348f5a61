//! Stock record for a single product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, ProductId, Result};

/// The stock held for one product.
///
/// `quantity` is never negative at any observable point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Creates a record with the given starting quantity.
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            updated_at: Utc::now(),
        }
    }

    /// Computes the quantity after applying `delta` without mutating the record.
    pub fn next_quantity(&self, delta: i64) -> Result<i64> {
        next_quantity(&self.product_id, self.quantity, delta)
    }
}

/// Validates `current + delta` against the non-negativity and range rules.
pub(crate) fn next_quantity(product_id: &ProductId, current: i64, delta: i64) -> Result<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::Overflow(product_id.clone()))?;
    if next < 0 {
        return Err(LedgerError::InsufficientStock {
            product_id: product_id.clone(),
            available: current,
            requested: delta.unsigned_abs(),
        });
    }
    Ok(next)
}
