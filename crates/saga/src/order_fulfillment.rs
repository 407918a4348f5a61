//! Order creation saga constants and tuning.

use std::time::Duration;

/// The saga type identifier used in logs.
pub const SAGA_TYPE: &str = "OrderCreation";

/// Step name: look up the unit price in the catalog.
pub const STEP_LOOKUP_PRICE: &str = "lookup_price";

/// Step name: deduct the line quantity from the ledger.
pub const STEP_RESERVE_STOCK: &str = "reserve_stock";

/// Step name: write the order to the order store.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: publish the order-created event.
pub const STEP_PUBLISH_EVENT: &str = "publish_event";

/// Default time allowed for each compensating restock.
pub const DEFAULT_COMPENSATION_TIMEOUT: Duration = Duration::from_secs(1);

/// Default time the event publish is always granted once the order is persisted.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

/// Tuning for the orchestrator.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Deadline for each compensating restock, independent of the caller's deadline.
    pub compensation_timeout: Duration,

    /// Minimum time granted to the publish step. The step runs until the
    /// caller's deadline or this long after persistence, whichever is later.
    pub publish_timeout: Duration,
}

impl SagaConfig {
    pub fn with_compensation_timeout(compensation_timeout: Duration) -> Self {
        Self {
            compensation_timeout,
            ..Self::default()
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            compensation_timeout: DEFAULT_COMPENSATION_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}
