//! Inventory ledger: the authoritative per-product stock counter.
//!
//! Every mutation goes through [`InventoryLedger::adjust`], which is atomic per
//! product id and never lets a quantity drop below zero. Adjustments for
//! different products are independent and may run in parallel.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;
pub mod record;

pub use common::ProductId;
pub use error::{LedgerError, Result};
pub use ledger::{InventoryLedger, LedgerExt};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use record::InventoryRecord;
