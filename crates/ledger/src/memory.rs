use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::ledger::record_adjustment;
use crate::record::next_quantity;
use crate::{InventoryLedger, InventoryRecord, LedgerError, ProductId, Result};

/// A per-product slot. `None` means the product has never been stocked.
type Slot = Arc<Mutex<Option<InventoryRecord>>>;

#[derive(Default)]
struct LedgerState {
    slots: RwLock<HashMap<ProductId, Slot>>,
    adjust_calls: AtomicU64,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
    fail_on_restock: AtomicBool,
}

/// In-memory inventory ledger.
///
/// Each product has its own lock, so adjustments to one product are
/// linearizable while different products proceed in parallel. The map lock
/// is only held long enough to look up or insert a slot.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<LedgerState>,
}

impl InMemoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger pre-stocked with the given quantities.
    pub async fn with_stock<I, P>(stock: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, i64)>,
        P: Into<ProductId>,
    {
        let ledger = Self::new();
        for (product_id, quantity) in stock {
            ledger.adjust(&product_id.into(), quantity).await?;
        }
        ledger.state.adjust_calls.store(0, Ordering::SeqCst);
        Ok(ledger)
    }

    /// Returns how many adjust calls have been received.
    pub fn adjust_calls(&self) -> u64 {
        self.state.adjust_calls.load(Ordering::SeqCst)
    }

    /// Adds artificial latency to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Makes every call fail as if the ledger service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes positive adjustments fail while deductions keep working.
    pub fn set_fail_on_restock(&self, fail: bool) {
        self.state.fail_on_restock.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of products with a record.
    pub async fn product_count(&self) -> usize {
        let slots: Vec<Slot> = self.state.slots.read().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    async fn simulate_faults(&self, delta: Option<i64>) -> Result<()> {
        let latency = self.state.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger is down".to_string()));
        }
        if matches!(delta, Some(d) if d > 0) && self.state.fail_on_restock.load(Ordering::SeqCst)
        {
            return Err(LedgerError::Unavailable("restock rejected".to_string()));
        }
        Ok(())
    }

    async fn existing_slot(&self, product_id: &ProductId) -> Option<Slot> {
        self.state.slots.read().await.get(product_id).cloned()
    }

    async fn slot(&self, product_id: &ProductId) -> Slot {
        if let Some(slot) = self.existing_slot(product_id).await {
            return slot;
        }
        self.state
            .slots
            .write()
            .await
            .entry(product_id.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryLedger {
    async fn get_quantity(&self, product_id: &ProductId) -> Result<i64> {
        Ok(self
            .get_record(product_id)
            .await?
            .map(|r| r.quantity)
            .unwrap_or(0))
    }

    #[tracing::instrument(skip(self, product_id), fields(product_id = %product_id))]
    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<i64> {
        self.state.adjust_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_faults(Some(delta)).await?;

        let slot = self.slot(product_id).await;
        let mut record = slot.lock().await;

        let current = record.as_ref().map(|r| r.quantity).unwrap_or(0);
        let result = next_quantity(product_id, current, delta);
        record_adjustment(&result);
        let next = result?;

        match record.as_mut() {
            Some(existing) => {
                existing.quantity = next;
                existing.updated_at = Utc::now();
            }
            None => *record = Some(InventoryRecord::new(product_id.clone(), next)),
        }

        tracing::debug!(delta, quantity = next, "stock adjusted");
        Ok(next)
    }

    async fn get_record(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        self.simulate_faults(None).await?;
        match self.existing_slot(product_id).await {
            Some(slot) => Ok(slot.lock().await.clone()),
            None => Ok(None),
        }
    }
}
