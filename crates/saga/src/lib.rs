//! Saga orchestration for order creation.
//!
//! For each cart the [`OrderOrchestrator`]:
//! 1. Looks up the unit price of every line in the catalog
//! 2. Deducts the line's quantity from the inventory ledger
//! 3. Persists the priced order
//! 4. Publishes an `order.created.v1` event
//!
//! If a step before persistence fails, the deductions made so far are
//! returned to the ledger in reverse order. Restocks that cannot be applied
//! are written to the reconciliation log.

pub mod coordinator;
pub mod error;
pub mod order_fulfillment;
pub mod reservation;
pub mod services;
pub mod state;

pub use coordinator::OrderOrchestrator;
pub use error::{CompensationFailed, OrderError, ServiceError};
pub use order_fulfillment::SagaConfig;
pub use reservation::{ReservedLine, StockReservation};
pub use services::{
    CatalogReader, EventSink, InMemoryCatalog, InMemoryEventSink, InMemoryOrderStore,
    InMemoryReconciliationLog, OrderStore, OrphanedDeduction, PostgresCatalog,
    PostgresOrderStore, PostgresOutboxSink, PublishedMessage, ReconciliationKind,
    ReconciliationLog,
};
pub use state::SagaState;
