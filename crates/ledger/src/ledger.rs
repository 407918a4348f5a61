use std::sync::Arc;

use async_trait::async_trait;

use crate::{InventoryRecord, LedgerError, ProductId, Result};

/// Core trait for inventory ledger implementations.
///
/// The ledger is the single source of truth for whether stock is available.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Returns the current quantity for a product.
    ///
    /// A product without a record has zero stock; this is not an error.
    async fn get_quantity(&self, product_id: &ProductId) -> Result<i64>;

    /// Applies `delta` to a product's quantity and returns the new quantity.
    ///
    /// Positive deltas restock, negative deltas deduct. The operation is atomic
    /// with respect to every other adjustment on the same product. Fails with
    /// `InsufficientStock` if the result would be negative, leaving the ledger
    /// unchanged. A record is created on the first non-negative adjustment.
    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<i64>;

    /// Returns the full record for a product, or None if it has never been stocked.
    async fn get_record(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>>;
}

#[async_trait]
impl<T: InventoryLedger + ?Sized> InventoryLedger for Arc<T> {
    async fn get_quantity(&self, product_id: &ProductId) -> Result<i64> {
        (**self).get_quantity(product_id).await
    }

    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<i64> {
        (**self).adjust(product_id, delta).await
    }

    async fn get_record(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        (**self).get_record(product_id).await
    }
}

/// Extension trait with intent-revealing wrappers around [`InventoryLedger::adjust`].
#[async_trait]
pub trait LedgerExt: InventoryLedger {
    /// Removes `quantity` units from stock.
    async fn deduct(&self, product_id: &ProductId, quantity: u32) -> Result<i64> {
        self.adjust(product_id, -i64::from(quantity)).await
    }

    /// Returns `quantity` units to stock.
    async fn restock(&self, product_id: &ProductId, quantity: u32) -> Result<i64> {
        self.adjust(product_id, i64::from(quantity)).await
    }
}

// Blanket implementation for all InventoryLedger implementations
impl<T: InventoryLedger + ?Sized> LedgerExt for T {}

/// Records adjustment metrics for any ledger implementation.
pub(crate) fn record_adjustment(result: &Result<i64>) {
    match result {
        Ok(_) => metrics::counter!("ledger_adjustments_total").increment(1),
        Err(LedgerError::InsufficientStock { .. }) => {
            metrics::counter!("ledger_insufficient_stock_total").increment(1)
        }
        Err(_) => metrics::counter!("ledger_adjustment_errors_total").increment(1),
    }
}
