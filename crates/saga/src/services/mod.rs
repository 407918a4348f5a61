//! Collaborator traits and their in-memory and PostgreSQL implementations.

pub mod catalog;
pub mod event_sink;
pub mod order_store;
pub mod postgres;
pub mod reconciliation;

pub use catalog::{CatalogReader, InMemoryCatalog};
pub use event_sink::{EventSink, InMemoryEventSink, PublishedMessage};
pub use order_store::{InMemoryOrderStore, OrderStore};
pub use postgres::{PostgresCatalog, PostgresOrderStore, PostgresOutboxSink};
pub use reconciliation::{
    InMemoryReconciliationLog, OrphanedDeduction, ReconciliationKind, ReconciliationLog,
};
