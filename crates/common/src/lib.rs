//! Shared identifiers and value types used across the order fulfillment crates.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{OrderId, ProductId, UserId};
